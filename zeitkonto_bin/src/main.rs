#[cfg(test)]
mod integration_test;

use std::str::FromStr;
use std::sync::Arc;

use dao_impl_sqlite::{
    absence::AbsenceDaoImpl, holiday::HolidayDaoImpl,
    overtime_correction::OvertimeCorrectionDaoImpl, overtime_month::OvertimeMonthDaoImpl,
    overtime_transaction::OvertimeTransactionDaoImpl, time_entry::TimeEntryDaoImpl,
    user::UserDaoImpl, vacation_balance::VacationBalanceDaoImpl, TransactionDaoImpl,
    TransactionImpl,
};
use service::config::ConfigService as _;
use service::holiday::HolidayService as _;
use service::permission::{Authentication, MockContext};
use service::scheduler::SchedulerService as _;
use service_impl::{
    absence::AbsenceServiceDeps, holiday::HolidayServiceDeps,
    overtime::OvertimeServiceDeps, overtime_correction::OvertimeCorrectionServiceDeps,
    permission::PermissionServiceDeps, rollover::RolloverServiceDeps,
    scheduler::SchedulerServiceDeps, time_entry::TimeEntryServiceDeps, user::UserServiceDeps,
    vacation::VacationServiceDeps,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

type Context = MockContext;
type Transaction = TransactionImpl;
type TransactionDao = TransactionDaoImpl;
type UserDao = UserDaoImpl;
type TimeEntryDao = TimeEntryDaoImpl;
type AbsenceDao = AbsenceDaoImpl;
type OvertimeCorrectionDao = OvertimeCorrectionDaoImpl;
type HolidayDao = HolidayDaoImpl;
type OvertimeTransactionDao = OvertimeTransactionDaoImpl;
type OvertimeMonthDao = OvertimeMonthDaoImpl;
type VacationBalanceDao = VacationBalanceDaoImpl;

type IdentityService = service_impl::identity::IdentityServiceDev;
type ClockService = service_impl::clock::ClockServiceImpl;
type UuidService = service_impl::uuid_service::UuidServiceImpl;
type ConfigService = service_impl::config::ConfigServiceImpl;
type Notifier = service_impl::notification::TracingNotifier;
type AuditService = service_impl::audit::TracingAuditService;
type HolidayOracle = service_impl::holiday::NoopHolidayOracle;

pub struct PermissionServiceDependencies;
impl PermissionServiceDeps for PermissionServiceDependencies {
    type Context = Context;
    type Transaction = Transaction;
    type UserDao = UserDao;
    type IdentityService = IdentityService;
    type TransactionDao = TransactionDao;
}
type PermissionService = service_impl::PermissionServiceImpl<PermissionServiceDependencies>;

pub struct OvertimeServiceDependencies;
impl OvertimeServiceDeps for OvertimeServiceDependencies {
    type Context = Context;
    type Transaction = Transaction;
    type UserDao = UserDao;
    type TimeEntryDao = TimeEntryDao;
    type AbsenceDao = AbsenceDao;
    type OvertimeCorrectionDao = OvertimeCorrectionDao;
    type HolidayDao = HolidayDao;
    type OvertimeTransactionDao = OvertimeTransactionDao;
    type OvertimeMonthDao = OvertimeMonthDao;
    type PermissionService = PermissionService;
    type ClockService = ClockService;
    type TransactionDao = TransactionDao;
}
type OvertimeService = service_impl::overtime::OvertimeServiceImpl<OvertimeServiceDependencies>;

pub struct UserServiceDependencies;
impl UserServiceDeps for UserServiceDependencies {
    type Context = Context;
    type Transaction = Transaction;
    type UserDao = UserDao;
    type PermissionService = PermissionService;
    type OvertimeService = OvertimeService;
    type ClockService = ClockService;
    type UuidService = UuidService;
    type TransactionDao = TransactionDao;
}
type UserService = service_impl::user::UserServiceImpl<UserServiceDependencies>;

pub struct VacationServiceDependencies;
impl VacationServiceDeps for VacationServiceDependencies {
    type Context = Context;
    type Transaction = Transaction;
    type VacationBalanceDao = VacationBalanceDao;
    type AbsenceDao = AbsenceDao;
    type UserDao = UserDao;
    type UserService = UserService;
    type PermissionService = PermissionService;
    type ConfigService = ConfigService;
    type TransactionDao = TransactionDao;
}
type VacationService = service_impl::vacation::VacationServiceImpl<VacationServiceDependencies>;

pub struct HolidayServiceDependencies;
impl HolidayServiceDeps for HolidayServiceDependencies {
    type Context = Context;
    type Transaction = Transaction;
    type HolidayDao = HolidayDao;
    type UserDao = UserDao;
    type HolidayOracle = HolidayOracle;
    type OvertimeService = OvertimeService;
    type PermissionService = PermissionService;
    type TransactionDao = TransactionDao;
}
type HolidayService = service_impl::holiday::HolidayServiceImpl<HolidayServiceDependencies>;

pub struct TimeEntryServiceDependencies;
impl TimeEntryServiceDeps for TimeEntryServiceDependencies {
    type Context = Context;
    type Transaction = Transaction;
    type TimeEntryDao = TimeEntryDao;
    type AbsenceDao = AbsenceDao;
    type UserService = UserService;
    type PermissionService = PermissionService;
    type OvertimeService = OvertimeService;
    type ClockService = ClockService;
    type UuidService = UuidService;
    type TransactionDao = TransactionDao;
}
type TimeEntryService = service_impl::time_entry::TimeEntryServiceImpl<TimeEntryServiceDependencies>;

pub struct OvertimeCorrectionServiceDependencies;
impl OvertimeCorrectionServiceDeps for OvertimeCorrectionServiceDependencies {
    type Context = Context;
    type Transaction = Transaction;
    type OvertimeCorrectionDao = OvertimeCorrectionDao;
    type UserService = UserService;
    type PermissionService = PermissionService;
    type OvertimeService = OvertimeService;
    type ClockService = ClockService;
    type UuidService = UuidService;
    type TransactionDao = TransactionDao;
}
type OvertimeCorrectionService =
    service_impl::overtime_correction::OvertimeCorrectionServiceImpl<
        OvertimeCorrectionServiceDependencies,
    >;

pub struct AbsenceServiceDependencies;
impl AbsenceServiceDeps for AbsenceServiceDependencies {
    type Context = Context;
    type Transaction = Transaction;
    type AbsenceDao = AbsenceDao;
    type TimeEntryDao = TimeEntryDao;
    type UserDao = UserDao;
    type HolidayDao = HolidayDao;
    type UserService = UserService;
    type PermissionService = PermissionService;
    type OvertimeService = OvertimeService;
    type VacationService = VacationService;
    type ConfigService = ConfigService;
    type ClockService = ClockService;
    type UuidService = UuidService;
    type Notifier = Notifier;
    type AuditService = AuditService;
    type TransactionDao = TransactionDao;
}
type AbsenceService = service_impl::absence::AbsenceServiceImpl<AbsenceServiceDependencies>;

pub struct RolloverServiceDependencies;
impl RolloverServiceDeps for RolloverServiceDependencies {
    type Context = Context;
    type Transaction = Transaction;
    type UserDao = UserDao;
    type AbsenceDao = AbsenceDao;
    type VacationBalanceDao = VacationBalanceDao;
    type OvertimeMonthDao = OvertimeMonthDao;
    type OvertimeService = OvertimeService;
    type VacationService = VacationService;
    type ConfigService = ConfigService;
    type PermissionService = PermissionService;
    type AuditService = AuditService;
    type TransactionDao = TransactionDao;
}
type RolloverService = service_impl::rollover::RolloverServiceImpl<RolloverServiceDependencies>;

pub struct SchedulerServiceDependencies;
impl SchedulerServiceDeps for SchedulerServiceDependencies {
    type Context = Context;
    type Transaction = Transaction;
    type RolloverService = RolloverService;
    type ClockService = ClockService;
}
type SchedulerService = service_impl::scheduler::SchedulerServiceImpl<SchedulerServiceDependencies>;

/// The fully wired engine.
pub struct Engine {
    pub config_service: Arc<ConfigService>,
    pub user_service: Arc<UserService>,
    pub time_entry_service: Arc<TimeEntryService>,
    pub absence_service: Arc<AbsenceService>,
    pub overtime_correction_service: Arc<OvertimeCorrectionService>,
    pub holiday_service: Arc<HolidayService>,
    pub overtime_service: Arc<OvertimeService>,
    pub vacation_service: Arc<VacationService>,
    pub rollover_service: Arc<RolloverService>,
    pub scheduler_service: SchedulerService,
}

pub fn build_engine(pool: Arc<SqlitePool>, identity: IdentityService) -> Engine {
    let transaction_dao = Arc::new(TransactionDaoImpl::new(pool.clone()));
    let user_dao = Arc::new(UserDaoImpl::new(pool.clone()));
    let time_entry_dao = Arc::new(TimeEntryDaoImpl::new(pool.clone()));
    let absence_dao = Arc::new(AbsenceDaoImpl::new(pool.clone()));
    let overtime_correction_dao = Arc::new(OvertimeCorrectionDaoImpl::new(pool.clone()));
    let holiday_dao = Arc::new(HolidayDaoImpl::new(pool.clone()));
    let overtime_transaction_dao = Arc::new(OvertimeTransactionDaoImpl::new(pool.clone()));
    let overtime_month_dao = Arc::new(OvertimeMonthDaoImpl::new(pool.clone()));
    let vacation_balance_dao = Arc::new(VacationBalanceDaoImpl::new(pool.clone()));

    let identity_service = Arc::new(identity);
    let config_service = Arc::new(ConfigService::from_env());
    let clock_service = Arc::new(
        ClockService::new(config_service.config().timezone.as_ref())
            .unwrap_or_else(ClockService::utc),
    );
    let uuid_service = Arc::new(service_impl::uuid_service::UuidServiceImpl);
    let notifier = Arc::new(service_impl::notification::TracingNotifier);
    let audit_service = Arc::new(service_impl::audit::TracingAuditService);
    let holiday_oracle = Arc::new(service_impl::holiday::NoopHolidayOracle);

    let permission_service = Arc::new(PermissionService {
        user_dao: user_dao.clone(),
        identity_service,
        transaction_dao: transaction_dao.clone(),
    });

    let overtime_service = Arc::new(OvertimeService {
        user_dao: user_dao.clone(),
        time_entry_dao: time_entry_dao.clone(),
        absence_dao: absence_dao.clone(),
        overtime_correction_dao: overtime_correction_dao.clone(),
        holiday_dao: holiday_dao.clone(),
        overtime_transaction_dao: overtime_transaction_dao.clone(),
        overtime_month_dao: overtime_month_dao.clone(),
        permission_service: permission_service.clone(),
        clock_service: clock_service.clone(),
        transaction_dao: transaction_dao.clone(),
    });

    let user_service = Arc::new(UserService {
        user_dao: user_dao.clone(),
        permission_service: permission_service.clone(),
        overtime_service: overtime_service.clone(),
        clock_service: clock_service.clone(),
        uuid_service: uuid_service.clone(),
        transaction_dao: transaction_dao.clone(),
    });

    let vacation_service = Arc::new(VacationService {
        vacation_balance_dao: vacation_balance_dao.clone(),
        absence_dao: absence_dao.clone(),
        user_dao: user_dao.clone(),
        user_service: user_service.clone(),
        permission_service: permission_service.clone(),
        config_service: config_service.clone(),
        transaction_dao: transaction_dao.clone(),
    });

    let holiday_service = Arc::new(HolidayService {
        holiday_dao: holiday_dao.clone(),
        user_dao: user_dao.clone(),
        holiday_oracle,
        overtime_service: overtime_service.clone(),
        permission_service: permission_service.clone(),
        transaction_dao: transaction_dao.clone(),
    });

    let time_entry_service = Arc::new(TimeEntryService {
        time_entry_dao: time_entry_dao.clone(),
        absence_dao: absence_dao.clone(),
        user_service: user_service.clone(),
        permission_service: permission_service.clone(),
        overtime_service: overtime_service.clone(),
        clock_service: clock_service.clone(),
        uuid_service: uuid_service.clone(),
        transaction_dao: transaction_dao.clone(),
    });

    let overtime_correction_service = Arc::new(OvertimeCorrectionService {
        overtime_correction_dao: overtime_correction_dao.clone(),
        user_service: user_service.clone(),
        permission_service: permission_service.clone(),
        overtime_service: overtime_service.clone(),
        clock_service: clock_service.clone(),
        uuid_service: uuid_service.clone(),
        transaction_dao: transaction_dao.clone(),
    });

    let absence_service = Arc::new(AbsenceService {
        absence_dao: absence_dao.clone(),
        time_entry_dao: time_entry_dao.clone(),
        user_dao: user_dao.clone(),
        holiday_dao: holiday_dao.clone(),
        user_service: user_service.clone(),
        permission_service: permission_service.clone(),
        overtime_service: overtime_service.clone(),
        vacation_service: vacation_service.clone(),
        config_service: config_service.clone(),
        clock_service: clock_service.clone(),
        uuid_service: uuid_service.clone(),
        notifier,
        audit_service: audit_service.clone(),
        transaction_dao: transaction_dao.clone(),
    });

    let rollover_service = Arc::new(RolloverService {
        user_dao,
        absence_dao,
        vacation_balance_dao,
        overtime_month_dao,
        overtime_service: overtime_service.clone(),
        vacation_service: vacation_service.clone(),
        config_service: config_service.clone(),
        permission_service,
        audit_service,
        transaction_dao,
    });

    let scheduler_service = SchedulerService::new(rollover_service.clone(), clock_service);

    Engine {
        config_service,
        user_service,
        time_entry_service,
        absence_service,
        overtime_correction_service,
        holiday_service,
        overtime_service,
        vacation_service,
        rollover_service,
        scheduler_service,
    }
}

#[cfg(feature = "local_logging")]
fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[cfg(not(feature = "local_logging"))]
fn setup_logging() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    setup_logging();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:zeitkonto.db".to_string());
    let options = SqliteConnectOptions::from_str(&database_url)
        .expect("DATABASE_URL must be a valid sqlite URL")
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);
    let pool = Arc::new(
        SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .expect("could not open the database"),
    );

    dao_impl_sqlite::create_schema(&pool)
        .await
        .expect("schema bootstrap failed");
    dao_impl_sqlite::verify_integrity(&pool)
        .await
        .expect("store integrity verification failed");

    let engine = build_engine(pool, IdentityService::default());

    let config = engine
        .config_service
        .get_config()
        .await
        .expect("configuration must load");
    info!(timezone = %config.timezone, "Configuration loaded");

    let current_year = time::OffsetDateTime::now_utc().year();
    match engine
        .holiday_service
        .load_year(current_year, Authentication::Full, None)
        .await
    {
        Ok(count) => info!("Loaded {count} holidays for {current_year}"),
        Err(err) => tracing::warn!("Holiday preload failed: {err}"),
    }

    engine
        .scheduler_service
        .start()
        .await
        .expect("scheduler must start");

    info!("Zeitkonto engine is up");
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for shutdown signal");
    info!("Shutting down");
}

use crate::gen_service_impl;
use std::sync::Arc;

use async_trait::async_trait;
use dao::{holiday::HolidayDao, user::UserDao, TransactionDao};
use service::{
    holiday::{Holiday, HolidayOracle, HolidayService},
    overtime::OvertimeService,
    permission::{Authentication, ADMIN_PRIVILEGE, EMPLOYEE_PRIVILEGE},
    PermissionService as _,
    ServiceError,
};
use tracing::warn;
use zeitkonto_utils::KontoMonth;

gen_service_impl! {
    struct HolidayServiceImpl: HolidayService = HolidayServiceDeps {
        HolidayDao: HolidayDao<Transaction = Self::Transaction> = holiday_dao,
        UserDao: UserDao<Transaction = Self::Transaction> = user_dao,
        HolidayOracle: HolidayOracle = holiday_oracle,
        OvertimeService: OvertimeService<Context = Self::Context, Transaction = Self::Transaction> = overtime_service,
        PermissionService: service::PermissionService<Context = Self::Context> = permission_service,
        TransactionDao: TransactionDao<Transaction = Self::Transaction> = transaction_dao,
    }
}

/// Oracle for deployments without an upstream holiday provider; years
/// resolve to an empty set and holidays are maintained by hand.
pub struct NoopHolidayOracle;

#[async_trait]
impl HolidayOracle for NoopHolidayOracle {
    async fn load_year(&self, _year: i32) -> Result<Arc<[Holiday]>, ServiceError> {
        Ok(Vec::new().into())
    }
}

fn year_bounds(year: i32) -> (time::Date, time::Date) {
    (
        time::Date::from_calendar_date(year, time::Month::January, 1)
            .expect("January 1st always exists"),
        time::Date::from_calendar_date(year, time::Month::December, 31)
            .expect("December 31st always exists"),
    )
}

impl<Deps: HolidayServiceDeps> HolidayServiceImpl<Deps> {
    /// A holiday changes every active user's target hours in its month.
    async fn rebuild_month_for_all_users(
        &self,
        month: KontoMonth,
        tx: Deps::Transaction,
    ) -> Result<(), ServiceError> {
        let users = self.user_dao.all(tx.clone()).await?;
        for user in users
            .iter()
            .filter(|user| user.deleted.is_none())
            .filter(|user| user.status == dao::user::UserStatusEntity::Active)
        {
            self.overtime_service
                .rebuild_month(user.id, month, Authentication::Full, tx.clone().into())
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<Deps: HolidayServiceDeps> HolidayService for HolidayServiceImpl<Deps> {
    type Context = Deps::Context;
    type Transaction = Deps::Transaction;

    async fn get_by_year(
        &self,
        year: i32,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[Holiday]>, ServiceError> {
        let (from, to) = year_bounds(year);
        self.get_in_range(from, to, context, tx).await
    }

    async fn get_in_range(
        &self,
        from: time::Date,
        to: time::Date,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[Holiday]>, ServiceError> {
        self.permission_service
            .check_permission(EMPLOYEE_PRIVILEGE, context)
            .await?;
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let holidays: Arc<[Holiday]> = self
            .holiday_dao
            .find_in_range(from, to, tx.clone())
            .await?
            .iter()
            .map(Holiday::from)
            .collect();
        self.transaction_dao.commit(tx).await?;
        Ok(holidays)
    }

    async fn create(
        &self,
        holiday: &Holiday,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Holiday, ServiceError> {
        self.permission_service
            .check_permission(ADMIN_PRIVILEGE, context)
            .await?;
        if holiday.name.is_empty() {
            return Err(ServiceError::ValidationError("holiday name must not be empty".into()));
        }
        let tx = self.transaction_dao.use_transaction(tx).await?;
        self.holiday_dao
            .upsert(&holiday.into(), "holiday_service::create", tx.clone())
            .await?;
        self.rebuild_month_for_all_users(KontoMonth::from_date(holiday.date), tx.clone())
            .await?;
        self.transaction_dao.commit(tx).await?;
        Ok(holiday.clone())
    }

    async fn delete(
        &self,
        date: time::Date,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError> {
        self.permission_service
            .check_permission(ADMIN_PRIVILEGE, context)
            .await?;
        let tx = self.transaction_dao.use_transaction(tx).await?;
        self.holiday_dao
            .find_by_date(date, tx.clone())
            .await?
            .ok_or_else(|| ServiceError::EntityNotFoundGeneric(date.to_string().into()))?;
        self.holiday_dao
            .delete(date, "holiday_service::delete", tx.clone())
            .await?;
        self.rebuild_month_for_all_users(KontoMonth::from_date(date), tx.clone())
            .await?;
        self.transaction_dao.commit(tx).await?;
        Ok(())
    }

    async fn load_year(
        &self,
        year: i32,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<u32, ServiceError> {
        self.permission_service
            .check_permission(ADMIN_PRIVILEGE, context)
            .await?;
        let holidays = match self.holiday_oracle.load_year(year).await {
            Ok(holidays) => holidays,
            Err(err) => {
                // The stored holidays stay authoritative when the provider
                // is unreachable.
                warn!("Holiday provider failed for {year}: {err}");
                return Ok(0);
            }
        };

        let tx = self.transaction_dao.use_transaction(tx).await?;
        let mut loaded = 0;
        for holiday in holidays.iter().filter(|holiday| holiday.date.year() == year) {
            self.holiday_dao
                .upsert(&holiday.into(), "holiday_service::load_year", tx.clone())
                .await?;
            loaded += 1;
        }
        self.transaction_dao.commit(tx).await?;
        Ok(loaded)
    }
}

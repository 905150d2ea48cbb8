use std::sync::Arc;

use crate::absence::{AbsenceServiceDeps, AbsenceServiceImpl};
use dao::absence::{AbsenceEntity, AbsenceStatusEntity, AbsenceTypeEntity, MockAbsenceDao};
use dao::holiday::MockHolidayDao;
use dao::time_entry::{MockTimeEntryDao, TimeEntryEntity, WorkLocationEntity};
use dao::user::MockUserDao;
use dao::{MockTransaction, MockTransactionDao};
use service::absence::{Absence, AbsenceService, AbsenceStatus, AbsenceType};
use service::audit::MockAuditService;
use service::clock::MockClockService;
use service::config::{
    AbsenceConflictPolicy, Config, MockConfigService, VacationCarryoverPolicy,
};
use service::notification::MockNotifier;
use service::overtime::MockOvertimeService;
use service::permission::{Authentication, MockPermissionService};
use service::user::{MockUserService, User, UserRole, UserStatus};
use service::uuid_service::MockUuidService;
use service::vacation::{MockVacationService, VacationBalance};
use service::ServiceError;
use time::macros::{date, datetime};
use uuid::{uuid, Uuid};

pub struct AbsenceServiceDependencies {
    pub absence_dao: MockAbsenceDao,
    pub time_entry_dao: MockTimeEntryDao,
    pub user_dao: MockUserDao,
    pub holiday_dao: MockHolidayDao,
    pub user_service: MockUserService,
    pub permission_service: MockPermissionService,
    pub overtime_service: MockOvertimeService,
    pub vacation_service: MockVacationService,
    pub config_service: MockConfigService,
    pub clock_service: MockClockService,
    pub uuid_service: MockUuidService,
    pub notifier: MockNotifier,
    pub audit_service: MockAuditService,
}

impl AbsenceServiceDeps for AbsenceServiceDependencies {
    type Context = ();
    type Transaction = MockTransaction;
    type AbsenceDao = MockAbsenceDao;
    type TimeEntryDao = MockTimeEntryDao;
    type UserDao = MockUserDao;
    type HolidayDao = MockHolidayDao;
    type UserService = MockUserService;
    type PermissionService = MockPermissionService;
    type OvertimeService = MockOvertimeService;
    type VacationService = MockVacationService;
    type ConfigService = MockConfigService;
    type ClockService = MockClockService;
    type UuidService = MockUuidService;
    type Notifier = MockNotifier;
    type AuditService = MockAuditService;
    type TransactionDao = MockTransactionDao;
}

fn default_user_id() -> Uuid {
    uuid!("7D8A69A2-11A6-4F10-A8E9-393A0D90B1C2")
}

fn default_absence_id() -> Uuid {
    uuid!("52C4C8A6-2B5A-4C43-9B2E-0D4D14A2E3F4")
}

fn default_version() -> Uuid {
    uuid!("F79C462A-8D4E-42E1-8171-DB4DBD019E50")
}

fn default_user() -> User {
    User {
        id: default_user_id(),
        username: "erika.m".into(),
        email: None,
        first_name: "Erika".into(),
        last_name: "Musterfrau".into(),
        role: UserRole::Employee,
        status: UserStatus::Active,
        weekly_hours: 40.0,
        work_schedule: None,
        vacation_days_per_year: 30,
        hire_date: date!(2025 - 01 - 01),
        end_date: None,
        created: Some(datetime!(2025-01-01 08:00)),
        deleted: None,
        version: default_version(),
    }
}

fn new_vacation() -> Absence {
    Absence {
        id: Uuid::nil(),
        user_id: default_user_id(),
        absence_type: AbsenceType::Vacation,
        // Monday and Tuesday.
        start_date: date!(2025 - 06 - 09),
        end_date: date!(2025 - 06 - 10),
        days: 0.0,
        status: AbsenceStatus::Pending,
        approved_by: None,
        approved_at: None,
        reason: None,
        created: None,
        deleted: None,
        version: Uuid::nil(),
    }
}

fn stored_absence(absence_type: AbsenceTypeEntity, status: AbsenceStatusEntity) -> AbsenceEntity {
    AbsenceEntity {
        id: default_absence_id(),
        user_id: default_user_id(),
        absence_type,
        start_date: date!(2025 - 06 - 09),
        end_date: date!(2025 - 06 - 10),
        days: 2.0,
        status,
        approved_by: None,
        approved_at: None,
        reason: None,
        created: datetime!(2025-06-01 08:00),
        deleted: None,
        version: default_version(),
    }
}

fn time_entry_on(date: time::Date) -> TimeEntryEntity {
    TimeEntryEntity {
        id: uuid!("A36D9DE5-0A1F-4F47-8E60-6E24E1BB94D0"),
        user_id: default_user_id(),
        date,
        hours: 8.0,
        break_minutes: 30,
        start_time: None,
        end_time: None,
        location: WorkLocationEntity::Office,
        created: datetime!(2025-06-09 17:00),
        deleted: None,
        version: default_version(),
    }
}

fn build_dependencies() -> AbsenceServiceDependencies {
    let mut deps = AbsenceServiceDependencies {
        absence_dao: MockAbsenceDao::new(),
        time_entry_dao: MockTimeEntryDao::new(),
        user_dao: MockUserDao::new(),
        holiday_dao: MockHolidayDao::new(),
        user_service: MockUserService::new(),
        permission_service: MockPermissionService::new(),
        overtime_service: MockOvertimeService::new(),
        vacation_service: MockVacationService::new(),
        config_service: MockConfigService::new(),
        clock_service: MockClockService::new(),
        uuid_service: MockUuidService::new(),
        notifier: MockNotifier::new(),
        audit_service: MockAuditService::new(),
    };
    deps.permission_service
        .expect_check_permission()
        .returning(|_, _| Ok(()));
    deps.permission_service
        .expect_current_username()
        .returning(|_| Ok(None));
    deps.user_service
        .expect_verify_user_is()
        .returning(|_, _, _| Ok(()));
    deps.user_service
        .expect_get()
        .returning(|_, _, _| Ok(default_user()));
    deps.holiday_dao
        .expect_find_in_range()
        .returning(|_, _, _| Ok(Vec::new().into()));
    deps.clock_service
        .expect_date_time_now()
        .returning(|| datetime!(2025-06-05 09:00));
    deps.uuid_service
        .expect_new_uuid()
        .returning(|_| uuid!("0D4F16C4-9E8A-4F7F-89C7-2D5D34F2B7E1"));
    deps.notifier.expect_emit().returning(|_, _, _| ());
    deps.audit_service
        .expect_record()
        .returning(|_, _, _, _, _| ());
    deps.config_service.expect_get_config().returning(|| {
        Ok(Config {
            timezone: "Europe/Berlin".into(),
            vacation_carryover_policy: VacationCarryoverPolicy::Capped5,
            absence_conflict_policy: AbsenceConflictPolicy::DeleteTimeEntries,
        })
    });
    deps
}

fn build_service(deps: AbsenceServiceDependencies) -> AbsenceServiceImpl<AbsenceServiceDependencies> {
    let mut transaction_dao = MockTransactionDao::new();
    transaction_dao
        .expect_use_transaction()
        .returning(|_| Ok(MockTransaction));
    transaction_dao.expect_commit().returning(|_| Ok(()));

    AbsenceServiceImpl {
        absence_dao: Arc::new(deps.absence_dao),
        time_entry_dao: Arc::new(deps.time_entry_dao),
        user_dao: Arc::new(deps.user_dao),
        holiday_dao: Arc::new(deps.holiday_dao),
        user_service: Arc::new(deps.user_service),
        permission_service: Arc::new(deps.permission_service),
        overtime_service: Arc::new(deps.overtime_service),
        vacation_service: Arc::new(deps.vacation_service),
        config_service: Arc::new(deps.config_service),
        clock_service: Arc::new(deps.clock_service),
        uuid_service: Arc::new(deps.uuid_service),
        notifier: Arc::new(deps.notifier),
        audit_service: Arc::new(deps.audit_service),
        transaction_dao: Arc::new(transaction_dao),
    }
}

fn full_vacation_balance() -> VacationBalance {
    VacationBalance {
        user_id: default_user_id(),
        year: 2025,
        entitlement: 30.0,
        carryover: 0.0,
        taken: 0.0,
        pending: 0.0,
    }
}

#[tokio::test]
async fn test_create_vacation_counts_business_days() {
    let mut deps = build_dependencies();
    deps.absence_dao
        .expect_find_overlapping()
        .returning(|_, _, _, _| Ok(Vec::new().into()));
    deps.time_entry_dao
        .expect_find_by_user_in_range()
        .returning(|_, _, _, _| Ok(Vec::new().into()));
    deps.vacation_service
        .expect_balance_for_year()
        .returning(|_, _, _, _| Ok(full_vacation_balance()));
    deps.absence_dao
        .expect_create()
        .withf(|entity, _, _| entity.days == 2.0 && entity.status == AbsenceStatusEntity::Pending)
        .returning(|_, _, _| Ok(()));

    let service = build_service(deps);
    let absence = service
        .create(&new_vacation(), Authentication::Full, None)
        .await
        .unwrap();
    assert_eq!(absence.status, AbsenceStatus::Pending);
    assert_eq!(absence.days, 2.0);
}

#[tokio::test]
async fn test_create_rejects_wrong_date_order() {
    let deps = build_dependencies();
    let service = build_service(deps);

    let mut absence = new_vacation();
    absence.start_date = date!(2025 - 06 - 10);
    absence.end_date = date!(2025 - 06 - 09);
    let result = service.create(&absence, Authentication::Full, None).await;
    assert!(matches!(result, Err(ServiceError::DateOrderWrong)));
}

#[tokio::test]
async fn test_create_rejects_start_before_hire_date() {
    let deps = build_dependencies();
    let service = build_service(deps);

    let mut absence = new_vacation();
    absence.start_date = date!(2024 - 12 - 29);
    absence.end_date = date!(2025 - 01 - 02);
    let result = service.create(&absence, Authentication::Full, None).await;
    assert!(matches!(result, Err(ServiceError::BeforeHireDate)));
}

#[tokio::test]
async fn test_create_rejects_overlapping_absence() {
    let mut deps = build_dependencies();
    deps.absence_dao
        .expect_find_overlapping()
        .returning(|_, _, _, _| {
            Ok(vec![stored_absence(
                AbsenceTypeEntity::Sick,
                AbsenceStatusEntity::Approved,
            )]
            .into())
        });

    let service = build_service(deps);
    let result = service
        .create(&new_vacation(), Authentication::Full, None)
        .await;
    assert!(matches!(result, Err(ServiceError::OverlappingAbsence)));
}

#[tokio::test]
async fn test_create_reports_conflicting_time_entries() {
    let mut deps = build_dependencies();
    deps.absence_dao
        .expect_find_overlapping()
        .returning(|_, _, _, _| Ok(Vec::new().into()));
    deps.time_entry_dao
        .expect_find_by_user_in_range()
        .returning(|_, _, _, _| Ok(vec![time_entry_on(date!(2025 - 06 - 09))].into()));

    let service = build_service(deps);
    let result = service
        .create(&new_vacation(), Authentication::Full, None)
        .await;
    match result {
        Err(ServiceError::TimeEntriesInRange(dates)) => {
            assert_eq!(dates.as_ref(), &[date!(2025 - 06 - 09)]);
        }
        other => panic!("expected TimeEntriesInRange, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_rejects_range_without_working_days() {
    let mut deps = build_dependencies();
    deps.absence_dao
        .expect_find_overlapping()
        .returning(|_, _, _, _| Ok(Vec::new().into()));
    deps.time_entry_dao
        .expect_find_by_user_in_range()
        .returning(|_, _, _, _| Ok(Vec::new().into()));

    let service = build_service(deps);
    let mut absence = new_vacation();
    // Saturday and Sunday only.
    absence.start_date = date!(2025 - 06 - 07);
    absence.end_date = date!(2025 - 06 - 08);
    let result = service.create(&absence, Authentication::Full, None).await;
    assert!(matches!(result, Err(ServiceError::NoWorkingDays)));
}

#[tokio::test]
async fn test_create_vacation_requires_remaining_days() {
    let mut deps = build_dependencies();
    deps.absence_dao
        .expect_find_overlapping()
        .returning(|_, _, _, _| Ok(Vec::new().into()));
    deps.time_entry_dao
        .expect_find_by_user_in_range()
        .returning(|_, _, _, _| Ok(Vec::new().into()));
    deps.vacation_service
        .expect_balance_for_year()
        .returning(|_, _, _, _| {
            Ok(VacationBalance {
                taken: 29.0,
                ..full_vacation_balance()
            })
        });

    let service = build_service(deps);
    let result = service
        .create(&new_vacation(), Authentication::Full, None)
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::InsufficientVacation { required, .. }) if required == 2.0
    ));
}

#[tokio::test]
async fn test_create_overtime_comp_requires_balance() {
    let mut deps = build_dependencies();
    deps.absence_dao
        .expect_find_overlapping()
        .returning(|_, _, _, _| Ok(Vec::new().into()));
    deps.time_entry_dao
        .expect_find_by_user_in_range()
        .returning(|_, _, _, _| Ok(Vec::new().into()));
    deps.overtime_service
        .expect_balance()
        .returning(|_, _, _| Ok(4.0));

    let service = build_service(deps);
    let mut absence = new_vacation();
    absence.absence_type = AbsenceType::OvertimeComp;
    let result = service.create(&absence, Authentication::Full, None).await;
    assert!(matches!(
        result,
        Err(ServiceError::InsufficientOvertime { required, available })
            if required == 16.0 && available == 4.0
    ));
}

#[tokio::test]
async fn test_create_sick_is_approved_and_rebuilt_immediately() {
    let mut deps = build_dependencies();
    deps.absence_dao
        .expect_find_overlapping()
        .returning(|_, _, _, _| Ok(Vec::new().into()));
    deps.absence_dao
        .expect_create()
        .withf(|entity, _, _| entity.status == AbsenceStatusEntity::Approved)
        .returning(|_, _, _| Ok(()));
    deps.overtime_service
        .expect_rebuild_months()
        .times(1)
        .returning(|_, _, _, _, _| Ok(()));

    let service = build_service(deps);
    let mut absence = new_vacation();
    absence.absence_type = AbsenceType::Sick;
    let absence = service
        .create(&absence, Authentication::Full, None)
        .await
        .unwrap();
    assert_eq!(absence.status, AbsenceStatus::Approved);
}

#[tokio::test]
async fn test_update_revalidates_pending_request() {
    let mut deps = build_dependencies();
    deps.absence_dao.expect_find_by_id().returning(|_, _| {
        Ok(Some(stored_absence(
            AbsenceTypeEntity::Vacation,
            AbsenceStatusEntity::Pending,
        )))
    });
    deps.absence_dao
        .expect_find_overlapping()
        .returning(|_, _, _, _| Ok(Vec::new().into()));
    deps.time_entry_dao
        .expect_find_by_user_in_range()
        .returning(|_, _, _, _| Ok(Vec::new().into()));
    deps.vacation_service
        .expect_balance_for_year()
        .returning(|_, _, _, _| Ok(full_vacation_balance()));
    deps.absence_dao
        .expect_update()
        .withf(|entity, _, _| entity.days == 4.0 && entity.status == AbsenceStatusEntity::Pending)
        .times(1)
        .returning(|_, _, _| Ok(()));

    let service = build_service(deps);
    let mut absence = new_vacation();
    absence.id = default_absence_id();
    // Monday through Thursday now.
    absence.end_date = date!(2025 - 06 - 12);
    let updated = service
        .update(&absence, Authentication::Full, None)
        .await
        .unwrap();
    assert_eq!(updated.days, 4.0);
}

#[tokio::test]
async fn test_update_rejects_non_pending_requests() {
    let mut deps = build_dependencies();
    deps.absence_dao.expect_find_by_id().returning(|_, _| {
        Ok(Some(stored_absence(
            AbsenceTypeEntity::Vacation,
            AbsenceStatusEntity::Approved,
        )))
    });

    let service = build_service(deps);
    let mut absence = new_vacation();
    absence.id = default_absence_id();
    let result = service.update(&absence, Authentication::Full, None).await;
    assert!(matches!(
        result,
        Err(ServiceError::InvalidStatusTransition(_))
    ));
}

#[tokio::test]
async fn test_approve_deletes_conflicting_entries_and_rebuilds() {
    let mut deps = build_dependencies();
    deps.absence_dao.expect_find_by_id().returning(|_, _| {
        Ok(Some(stored_absence(
            AbsenceTypeEntity::Vacation,
            AbsenceStatusEntity::Pending,
        )))
    });
    deps.absence_dao
        .expect_find_overlapping()
        .returning(|_, _, _, _| Ok(Vec::new().into()));
    deps.time_entry_dao
        .expect_find_by_user_in_range()
        .returning(|_, _, _, _| Ok(vec![time_entry_on(date!(2025 - 06 - 09))].into()));
    deps.time_entry_dao
        .expect_update()
        .withf(|entity, _, _| entity.deleted.is_some())
        .times(1)
        .returning(|_, _, _| Ok(()));
    deps.absence_dao
        .expect_update()
        .withf(|entity, _, _| entity.status == AbsenceStatusEntity::Approved)
        .returning(|_, _, _| Ok(()));
    deps.overtime_service
        .expect_rebuild_months()
        .times(1)
        .returning(|_, _, _, _, _| Ok(()));

    let service = build_service(deps);
    let absence = service
        .approve(default_absence_id(), Authentication::Full, None)
        .await
        .unwrap();
    assert_eq!(absence.status, AbsenceStatus::Approved);
}

#[tokio::test]
async fn test_approve_approved_absence_fails() {
    let mut deps = build_dependencies();
    deps.absence_dao.expect_find_by_id().returning(|_, _| {
        Ok(Some(stored_absence(
            AbsenceTypeEntity::Vacation,
            AbsenceStatusEntity::Approved,
        )))
    });

    let service = build_service(deps);
    let result = service
        .approve(default_absence_id(), Authentication::Full, None)
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::InvalidStatusTransition(_))
    ));
}

#[tokio::test]
async fn test_reject_approved_absence_triggers_rebuild() {
    let mut deps = build_dependencies();
    deps.absence_dao.expect_find_by_id().returning(|_, _| {
        Ok(Some(stored_absence(
            AbsenceTypeEntity::Vacation,
            AbsenceStatusEntity::Approved,
        )))
    });
    deps.absence_dao
        .expect_update()
        .withf(|entity, _, _| entity.status == AbsenceStatusEntity::Rejected)
        .returning(|_, _, _| Ok(()));
    deps.overtime_service
        .expect_rebuild_months()
        .times(1)
        .returning(|_, _, _, _, _| Ok(()));

    let service = build_service(deps);
    let absence = service
        .reject(default_absence_id(), Authentication::Full, None)
        .await
        .unwrap();
    assert_eq!(absence.status, AbsenceStatus::Rejected);
}

#[tokio::test]
async fn test_reject_pending_absence_skips_rebuild() {
    let mut deps = build_dependencies();
    deps.absence_dao.expect_find_by_id().returning(|_, _| {
        Ok(Some(stored_absence(
            AbsenceTypeEntity::Vacation,
            AbsenceStatusEntity::Pending,
        )))
    });
    deps.absence_dao
        .expect_update()
        .returning(|_, _, _| Ok(()));
    // No rebuild expectation: a pending request never reached the ledger.

    let service = build_service(deps);
    let absence = service
        .reject(default_absence_id(), Authentication::Full, None)
        .await
        .unwrap();
    assert_eq!(absence.status, AbsenceStatus::Rejected);
}

#[tokio::test]
async fn test_employee_may_delete_only_pending_requests() {
    let mut deps = build_dependencies();
    deps.absence_dao.expect_find_by_id().returning(|_, _| {
        Ok(Some(stored_absence(
            AbsenceTypeEntity::Vacation,
            AbsenceStatusEntity::Approved,
        )))
    });
    // The caller is not an admin but is the owner.
    deps.permission_service = MockPermissionService::new();
    deps.permission_service
        .expect_check_permission()
        .returning(|_, _| Err(ServiceError::Forbidden));
    deps.permission_service
        .expect_current_username()
        .returning(|_| Ok(Some("erika.m".into())));

    let service = build_service(deps);
    let result = service
        .delete(default_absence_id(), Authentication::Context(()), None)
        .await;
    assert!(matches!(result, Err(ServiceError::Forbidden)));
}

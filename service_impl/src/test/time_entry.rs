use std::sync::Arc;

use crate::time_entry::{TimeEntryServiceDeps, TimeEntryServiceImpl};
use dao::absence::{AbsenceEntity, AbsenceStatusEntity, AbsenceTypeEntity, MockAbsenceDao};
use dao::time_entry::MockTimeEntryDao;
use dao::{MockTransaction, MockTransactionDao};
use service::clock::MockClockService;
use service::overtime::MockOvertimeService;
use service::permission::{Authentication, MockPermissionService};
use service::time_entry::{TimeEntry, TimeEntryService, WorkLocation};
use service::user::{MockUserService, User, UserRole, UserStatus};
use service::uuid_service::MockUuidService;
use service::ServiceError;
use time::macros::{date, datetime};
use uuid::{uuid, Uuid};
use zeitkonto_utils::KontoMonth;

pub struct TimeEntryServiceDependencies {
    pub time_entry_dao: MockTimeEntryDao,
    pub absence_dao: MockAbsenceDao,
    pub user_service: MockUserService,
    pub permission_service: MockPermissionService,
    pub overtime_service: MockOvertimeService,
    pub clock_service: MockClockService,
    pub uuid_service: MockUuidService,
}

impl TimeEntryServiceDeps for TimeEntryServiceDependencies {
    type Context = ();
    type Transaction = MockTransaction;
    type TimeEntryDao = MockTimeEntryDao;
    type AbsenceDao = MockAbsenceDao;
    type UserService = MockUserService;
    type PermissionService = MockPermissionService;
    type OvertimeService = MockOvertimeService;
    type ClockService = MockClockService;
    type UuidService = MockUuidService;
    type TransactionDao = MockTransactionDao;
}

fn default_user_id() -> Uuid {
    uuid!("7D8A69A2-11A6-4F10-A8E9-393A0D90B1C2")
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
        end_date: Some(date!(2026 - 06 - 30)),
        created: Some(datetime!(2025-01-01 08:00)),
        deleted: None,
        version: uuid!("F79C462A-8D4E-42E1-8171-DB4DBD019E50"),
    }
}

fn new_entry(date: time::Date, hours: f32) -> TimeEntry {
    TimeEntry {
        id: Uuid::nil(),
        user_id: default_user_id(),
        date,
        hours,
        break_minutes: 45,
        start_time: None,
        end_time: None,
        location: WorkLocation::Office,
        created: None,
        deleted: None,
        version: Uuid::nil(),
    }
}

fn approved_absence(absence_type: AbsenceTypeEntity) -> AbsenceEntity {
    AbsenceEntity {
        id: uuid!("52C4C8A6-2B5A-4C43-9B2E-0D4D14A2E3F4"),
        user_id: default_user_id(),
        absence_type,
        start_date: date!(2025 - 06 - 09),
        end_date: date!(2025 - 06 - 10),
        days: 2.0,
        status: AbsenceStatusEntity::Approved,
        approved_by: None,
        approved_at: None,
        reason: None,
        created: datetime!(2025-06-01 08:00),
        deleted: None,
        version: uuid!("F79C462A-8D4E-42E1-8171-DB4DBD019E50"),
    }
}

fn build_dependencies() -> TimeEntryServiceDependencies {
    let mut deps = TimeEntryServiceDependencies {
        time_entry_dao: MockTimeEntryDao::new(),
        absence_dao: MockAbsenceDao::new(),
        user_service: MockUserService::new(),
        permission_service: MockPermissionService::new(),
        overtime_service: MockOvertimeService::new(),
        clock_service: MockClockService::new(),
        uuid_service: MockUuidService::new(),
    };
    deps.permission_service
        .expect_check_permission()
        .returning(|_, _| Ok(()));
    deps.user_service
        .expect_verify_user_is()
        .returning(|_, _, _| Ok(()));
    deps.user_service
        .expect_get()
        .returning(|_, _, _| Ok(default_user()));
    deps.clock_service
        .expect_date_time_now()
        .returning(|| datetime!(2025-06-05 09:00));
    deps.uuid_service
        .expect_new_uuid()
        .returning(|_| uuid!("0D4F16C4-9E8A-4F7F-89C7-2D5D34F2B7E1"));
    deps
}

fn build_service(
    deps: TimeEntryServiceDependencies,
) -> TimeEntryServiceImpl<TimeEntryServiceDependencies> {
    let mut transaction_dao = MockTransactionDao::new();
    transaction_dao
        .expect_use_transaction()
        .returning(|_| Ok(MockTransaction));
    transaction_dao.expect_commit().returning(|_| Ok(()));

    TimeEntryServiceImpl {
        time_entry_dao: Arc::new(deps.time_entry_dao),
        absence_dao: Arc::new(deps.absence_dao),
        user_service: Arc::new(deps.user_service),
        permission_service: Arc::new(deps.permission_service),
        overtime_service: Arc::new(deps.overtime_service),
        clock_service: Arc::new(deps.clock_service),
        uuid_service: Arc::new(deps.uuid_service),
        transaction_dao: Arc::new(transaction_dao),
    }
}

#[tokio::test]
async fn test_create_persists_and_rebuilds_month() {
    let mut deps = build_dependencies();
    deps.absence_dao
        .expect_find_approved_in_range()
        .returning(|_, _, _, _| Ok(Vec::new().into()));
    deps.time_entry_dao
        .expect_create()
        .withf(|entity, process, _| {
            entity.hours == 8.5 && process == "time_entry_service::create"
        })
        .times(1)
        .returning(|_, _, _| Ok(()));
    deps.overtime_service
        .expect_rebuild_month()
        .withf(|_, month, _, _| *month == KontoMonth::new(2025, 6).unwrap())
        .times(1)
        .returning(|_, _, _, _| Ok(()));

    let service = build_service(deps);
    let entry = service
        .create(&new_entry(date!(2025 - 06 - 02), 8.5), Authentication::Full, None)
        .await
        .unwrap();
    assert!(!entry.id.is_nil());
    assert!(entry.created.is_some());
}

#[tokio::test]
async fn test_create_rejects_negative_hours() {
    let deps = build_dependencies();
    let service = build_service(deps);
    let result = service
        .create(&new_entry(date!(2025 - 06 - 02), -1.0), Authentication::Full, None)
        .await;
    assert!(matches!(result, Err(ServiceError::NegativeHours)));
}

#[tokio::test]
async fn test_create_rejects_dates_outside_employment_window() {
    let deps = build_dependencies();
    let service = build_service(deps);

    let result = service
        .create(&new_entry(date!(2024 - 12 - 31), 8.0), Authentication::Full, None)
        .await;
    assert!(matches!(result, Err(ServiceError::BeforeHireDate)));

    let result = service
        .create(&new_entry(date!(2026 - 07 - 01), 8.0), Authentication::Full, None)
        .await;
    assert!(matches!(result, Err(ServiceError::AfterEndDate)));
}

#[tokio::test]
async fn test_create_rejects_approved_absence_days() {
    let mut deps = build_dependencies();
    deps.absence_dao
        .expect_find_approved_in_range()
        .returning(|_, _, _, _| Ok(vec![approved_absence(AbsenceTypeEntity::Vacation)].into()));

    let service = build_service(deps);
    let result = service
        .create(&new_entry(date!(2025 - 06 - 09), 8.0), Authentication::Full, None)
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::AbsenceCoversDate(date)) if date == date!(2025 - 06 - 09)
    ));
}

#[tokio::test]
async fn test_create_allows_entries_on_sick_days() {
    let mut deps = build_dependencies();
    deps.absence_dao
        .expect_find_approved_in_range()
        .returning(|_, _, _, _| Ok(vec![approved_absence(AbsenceTypeEntity::Sick)].into()));
    deps.time_entry_dao
        .expect_create()
        .returning(|_, _, _| Ok(()));
    deps.overtime_service
        .expect_rebuild_month()
        .returning(|_, _, _, _| Ok(()));

    let service = build_service(deps);
    let result = service
        .create(&new_entry(date!(2025 - 06 - 09), 3.0), Authentication::Full, None)
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_delete_soft_deletes_and_rebuilds() {
    let mut deps = build_dependencies();
    let stored = dao::time_entry::TimeEntryEntity {
        id: uuid!("A36D9DE5-0A1F-4F47-8E60-6E24E1BB94D0"),
        user_id: default_user_id(),
        date: date!(2025 - 06 - 02),
        hours: 8.0,
        break_minutes: 45,
        start_time: None,
        end_time: None,
        location: dao::time_entry::WorkLocationEntity::Office,
        created: datetime!(2025-06-02 17:00),
        deleted: None,
        version: uuid!("F79C462A-8D4E-42E1-8171-DB4DBD019E50"),
    };
    deps.time_entry_dao
        .expect_find_by_id()
        .returning(move |_, _| Ok(Some(stored.clone())));
    deps.time_entry_dao
        .expect_update()
        .withf(|entity, _, _| entity.deleted.is_some())
        .times(1)
        .returning(|_, _, _| Ok(()));
    deps.overtime_service
        .expect_rebuild_month()
        .times(1)
        .returning(|_, _, _, _| Ok(()));

    let service = build_service(deps);
    service
        .delete(uuid!("A36D9DE5-0A1F-4F47-8E60-6E24E1BB94D0"), Authentication::Full, None)
        .await
        .unwrap();
}

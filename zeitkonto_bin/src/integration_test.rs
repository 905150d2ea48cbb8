use std::str::FromStr;
use std::sync::Arc;

use service::absence::{Absence, AbsenceService, AbsenceStatus, AbsenceType};
use service::holiday::{Holiday, HolidayService};
use service::overtime::{OvertimeService, TransactionType};
use service::overtime_correction::{
    CorrectionType, OvertimeCorrection, OvertimeCorrectionService,
};
use service::permission::Authentication;
use service::rollover::RolloverService;
use service::time_entry::{TimeEntry, TimeEntryService, WorkLocation};
use service::user::{User, UserRole, UserService, UserStatus, WeekSchedule};
use service::vacation::VacationService;
use service::ServiceError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use time::macros::date;
use uuid::Uuid;
use zeitkonto_utils::KontoMonth;

use crate::{build_engine, Engine, IdentityService};

async fn setup() -> Engine {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = Arc::new(
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap(),
    );
    dao_impl_sqlite::create_schema(&pool).await.unwrap();
    dao_impl_sqlite::verify_integrity(&pool).await.unwrap();
    build_engine(pool, IdentityService::new("hr.admin"))
}

fn user_template(username: &str) -> User {
    User {
        id: Uuid::nil(),
        username: username.into(),
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
        created: None,
        deleted: None,
        version: Uuid::nil(),
    }
}

async fn create_employee(engine: &Engine, username: &str) -> User {
    engine
        .user_service
        .create(&user_template(username), Authentication::Full, None)
        .await
        .unwrap()
}

async fn create_admin(engine: &Engine, username: &str) -> User {
    let mut template = user_template(username);
    template.role = UserRole::Admin;
    engine
        .user_service
        .create(&template, Authentication::Full, None)
        .await
        .unwrap()
}

fn entry_template(user_id: Uuid, date: time::Date, hours: f32) -> TimeEntry {
    TimeEntry {
        id: Uuid::nil(),
        user_id,
        date,
        hours,
        break_minutes: 30,
        start_time: None,
        end_time: None,
        location: WorkLocation::Office,
        created: None,
        deleted: None,
        version: Uuid::nil(),
    }
}

fn absence_template(
    user_id: Uuid,
    absence_type: AbsenceType,
    start: time::Date,
    end: time::Date,
) -> Absence {
    Absence {
        id: Uuid::nil(),
        user_id,
        absence_type,
        start_date: start,
        end_date: end,
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

async fn log_hours(engine: &Engine, user_id: Uuid, date: time::Date, hours: f32) {
    engine
        .time_entry_service
        .create(&entry_template(user_id, date, hours), Authentication::Full, None)
        .await
        .unwrap();
}

/// Fills every Mon-Fri of the month with a plain eight-hour day so that the
/// month nets to zero except for the deviations a test sets up explicitly.
async fn log_workdays(engine: &Engine, user_id: Uuid, month: KontoMonth, skip: &[time::Date]) {
    for date in month.days() {
        if matches!(
            date.weekday(),
            time::Weekday::Saturday | time::Weekday::Sunday
        ) {
            continue;
        }
        if skip.contains(&date) {
            continue;
        }
        log_hours(engine, user_id, date, 8.0).await;
    }
}

async fn balance(engine: &Engine, user_id: Uuid) -> f32 {
    engine
        .overtime_service
        .balance(user_id, Authentication::Full, None)
        .await
        .unwrap()
}

async fn ledger(
    engine: &Engine,
    user_id: Uuid,
    from: time::Date,
    to: time::Date,
) -> Arc<[service::overtime::OvertimeTransaction]> {
    engine
        .overtime_service
        .transactions_in_range(user_id, from, to, Authentication::Full, None)
        .await
        .unwrap()
}

/// Rows ordered by (date, id) must form a strict running sum.
async fn assert_running_sum(engine: &Engine, user_id: Uuid) {
    let rows = ledger(engine, user_id, date!(2020 - 01 - 01), date!(2040 - 12 - 31)).await;
    for pair in rows.windows(2) {
        assert!(
            (pair[1].balance_before - pair[0].balance_after).abs() < 1e-3,
            "running sum broken between {:?} and {:?}",
            pair[0],
            pair[1]
        );
    }
    for row in rows.iter() {
        assert!(
            (row.balance_after - row.balance_before - row.hours).abs() < 1e-3,
            "row not self-consistent: {row:?}"
        );
    }
}

fn june_25() -> KontoMonth {
    KontoMonth::new(2025, 6).unwrap()
}

#[tokio::test]
async fn test_time_entries_accumulate_overtime() {
    let engine = setup().await;
    let user = create_employee(&engine, "erika.m").await;

    log_workdays(&engine, user.id, june_25(), &[date!(2025 - 06 - 02)]).await;
    // Monday with one extra hour, Saturday fully extra.
    log_hours(&engine, user.id, date!(2025 - 06 - 02), 9.0).await;
    log_hours(&engine, user.id, date!(2025 - 06 - 07), 4.0).await;

    assert!((balance(&engine, user.id).await - 5.0).abs() < 1e-3);
    assert_running_sum(&engine, user.id).await;

    // Plain eight-hour days net zero and emit no rows at all.
    let rows = ledger(&engine, user.id, date!(2025 - 06 - 01), date!(2025 - 06 - 30)).await;
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn test_multiple_entries_per_day_sum_additively() {
    let engine = setup().await;
    let user = create_employee(&engine, "erika.m").await;

    log_workdays(&engine, user.id, june_25(), &[date!(2025 - 06 - 02)]).await;
    log_hours(&engine, user.id, date!(2025 - 06 - 02), 5.0).await;
    log_hours(&engine, user.id, date!(2025 - 06 - 02), 4.5).await;

    assert!((balance(&engine, user.id).await - 1.5).abs() < 1e-3);
}

#[tokio::test]
async fn test_vacation_is_balance_neutral() {
    let engine = setup().await;
    let user = create_employee(&engine, "erika.m").await;

    let vacation_days = [date!(2025 - 06 - 09), date!(2025 - 06 - 10)];
    log_workdays(&engine, user.id, june_25(), &vacation_days).await;
    log_hours(&engine, user.id, date!(2025 - 06 - 07), 2.0).await;
    let before = balance(&engine, user.id).await;
    assert!((before - 2.0).abs() < 1e-3);

    let absence = engine
        .absence_service
        .create(
            &absence_template(user.id, AbsenceType::Vacation, vacation_days[0], vacation_days[1]),
            Authentication::Full,
            None,
        )
        .await
        .unwrap();
    assert_eq!(absence.status, AbsenceStatus::Pending);
    assert_eq!(absence.days, 2.0);

    engine
        .absence_service
        .approve(absence.id, Authentication::Full, None)
        .await
        .unwrap();

    assert!((balance(&engine, user.id).await - before).abs() < 1e-3);
    assert_running_sum(&engine, user.id).await;

    // The two vacation days decompose into earned/credit pairs.
    let rows = ledger(&engine, user.id, vacation_days[0], vacation_days[1]).await;
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].transaction_type, TransactionType::Earned);
    assert!((rows[0].hours + 8.0).abs() < 1e-3);
    assert_eq!(rows[1].transaction_type, TransactionType::VacationCredit);
    assert!((rows[1].hours - 8.0).abs() < 1e-3);
}

#[tokio::test]
async fn test_rejection_after_approval_reverses_credits() {
    let engine = setup().await;
    let user = create_employee(&engine, "erika.m").await;

    let january = KontoMonth::from_date(date!(2026 - 01 - 01));
    let vacation_days = [date!(2026 - 01 - 12), date!(2026 - 01 - 13)];
    log_workdays(&engine, user.id, january, &vacation_days).await;
    log_hours(&engine, user.id, date!(2026 - 01 - 03), 3.5).await;

    let absence = engine
        .absence_service
        .create(
            &absence_template(user.id, AbsenceType::Vacation, vacation_days[0], vacation_days[1]),
            Authentication::Full,
            None,
        )
        .await
        .unwrap();
    engine
        .absence_service
        .approve(absence.id, Authentication::Full, None)
        .await
        .unwrap();
    assert!((balance(&engine, user.id).await - 3.5).abs() < 1e-3);

    engine
        .absence_service
        .reject(absence.id, Authentication::Full, None)
        .await
        .unwrap();

    // The absence is no longer approved: its earned/credit pairs are not
    // regenerated and only the Saturday row remains.
    let rows = ledger(&engine, user.id, date!(2026 - 01 - 01), date!(2026 - 01 - 31)).await;
    assert_eq!(rows.len(), 3);
    assert!((balance(&engine, user.id).await + 12.5).abs() < 1e-3);
    assert_running_sum(&engine, user.id).await;
}

#[tokio::test]
async fn test_absence_creation_conflicts_with_time_entries() {
    let engine = setup().await;
    let user = create_employee(&engine, "erika.m").await;

    log_hours(&engine, user.id, date!(2025 - 07 - 01), 8.0).await;

    let result = engine
        .absence_service
        .create(
            &absence_template(
                user.id,
                AbsenceType::Vacation,
                date!(2025 - 07 - 01),
                date!(2025 - 07 - 02),
            ),
            Authentication::Full,
            None,
        )
        .await;
    match result {
        Err(ServiceError::TimeEntriesInRange(dates)) => {
            assert_eq!(dates.as_ref(), &[date!(2025 - 07 - 01)]);
        }
        other => panic!("expected TimeEntriesInRange, got {other:?}"),
    }
}

#[tokio::test]
async fn test_approval_deletes_conflicting_time_entries() {
    let engine = setup().await;
    let user = create_employee(&engine, "erika.m").await;

    let july = KontoMonth::from_date(date!(2025 - 07 - 01));
    let vacation_days = [date!(2025 - 07 - 07), date!(2025 - 07 - 08)];
    log_workdays(&engine, user.id, july, &vacation_days).await;

    let absence = engine
        .absence_service
        .create(
            &absence_template(user.id, AbsenceType::Vacation, vacation_days[0], vacation_days[1]),
            Authentication::Full,
            None,
        )
        .await
        .unwrap();
    // Entry logged while the request was still pending.
    log_hours(&engine, user.id, vacation_days[0], 8.0).await;

    engine
        .absence_service
        .approve(absence.id, Authentication::Full, None)
        .await
        .unwrap();

    let entries = engine
        .time_entry_service
        .find_by_user_in_range(
            user.id,
            vacation_days[0],
            vacation_days[1],
            Authentication::Full,
            None,
        )
        .await
        .unwrap();
    assert!(entries.is_empty(), "conflicting entry must be deleted");
    assert!(balance(&engine, user.id).await.abs() < 1e-3);
}

#[tokio::test]
async fn test_time_entry_rejected_on_approved_absence_day() {
    let engine = setup().await;
    let user = create_employee(&engine, "erika.m").await;

    let absence = engine
        .absence_service
        .create(
            &absence_template(
                user.id,
                AbsenceType::Vacation,
                date!(2025 - 07 - 07),
                date!(2025 - 07 - 08),
            ),
            Authentication::Full,
            None,
        )
        .await
        .unwrap();
    engine
        .absence_service
        .approve(absence.id, Authentication::Full, None)
        .await
        .unwrap();

    let result = engine
        .time_entry_service
        .create(
            &entry_template(user.id, date!(2025 - 07 - 07), 4.0),
            Authentication::Full,
            None,
        )
        .await;
    assert!(matches!(result, Err(ServiceError::AbsenceCoversDate(_))));
}

#[tokio::test]
async fn test_sick_leave_coexists_with_time_entries() {
    let engine = setup().await;
    let user = create_employee(&engine, "erika.m").await;

    let july = KontoMonth::from_date(date!(2025 - 07 - 01));
    let sick_days = [date!(2025 - 07 - 14), date!(2025 - 07 - 15)];
    log_workdays(&engine, user.id, july, &sick_days).await;
    log_hours(&engine, user.id, sick_days[0], 3.0).await;

    // Sick leave is recorded approved despite the logged entry.
    let absence = engine
        .absence_service
        .create(
            &absence_template(user.id, AbsenceType::Sick, sick_days[0], sick_days[1]),
            Authentication::Full,
            None,
        )
        .await
        .unwrap();
    assert_eq!(absence.status, AbsenceStatus::Approved);

    // Worked hours on the sick day count on top of the credit.
    assert!((balance(&engine, user.id).await - 3.0).abs() < 1e-3);
    assert_running_sum(&engine, user.id).await;
}

#[tokio::test]
async fn test_unpaid_leave_reduces_target_not_balance() {
    let engine = setup().await;
    let user = create_employee(&engine, "erika.m").await;

    let december = KontoMonth::from_date(date!(2025 - 12 - 01));
    let unpaid: Vec<time::Date> = zeitkonto_utils::iter_days(date!(2025 - 12 - 01), date!(2025 - 12 - 05)).collect();
    log_workdays(&engine, user.id, december, &unpaid).await;

    let absence = engine
        .absence_service
        .create(
            &absence_template(
                user.id,
                AbsenceType::Unpaid,
                date!(2025 - 12 - 01),
                date!(2025 - 12 - 05),
            ),
            Authentication::Full,
            None,
        )
        .await
        .unwrap();
    engine
        .absence_service
        .approve(absence.id, Authentication::Full, None)
        .await
        .unwrap();

    assert!(balance(&engine, user.id).await.abs() < 1e-3);

    // 23 workdays in December 2025, five of them unpaid.
    let report = engine
        .overtime_service
        .monthly_report(user.id, 2025, Some(12), Authentication::Full, None)
        .await
        .unwrap();
    let december_row = &report[0];
    assert!((december_row.target_hours - 18.0 * 8.0).abs() < 1e-3);
    assert!((december_row.actual_hours - 18.0 * 8.0).abs() < 1e-3);
    assert!(december_row.overtime.abs() < 1e-3);

    // Each unpaid day nets to zero via its adjustment row.
    let rows = ledger(&engine, user.id, date!(2025 - 12 - 01), date!(2025 - 12 - 05)).await;
    assert_eq!(rows.len(), 10);
    assert!(rows
        .iter()
        .any(|row| row.transaction_type == TransactionType::UnpaidAdjustment));
    assert_running_sum(&engine, user.id).await;
}

#[tokio::test]
async fn test_overtime_comp_requires_sufficient_balance() {
    let engine = setup().await;
    let user = create_employee(&engine, "erika.m").await;

    // Compensation is requested for a far-off Monday so the gate sees
    // exactly the overtime accumulated here.
    let comp_day = date!(2031 - 01 - 06);

    log_workdays(&engine, user.id, june_25(), &[]).await;
    log_hours(&engine, user.id, date!(2025 - 06 - 07), 4.0).await;
    let result = engine
        .absence_service
        .create(
            &absence_template(user.id, AbsenceType::OvertimeComp, comp_day, comp_day),
            Authentication::Full,
            None,
        )
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::InsufficientOvertime { .. })
    ));

    // +10h cover the eight-hour day off.
    log_hours(&engine, user.id, date!(2025 - 06 - 14), 6.0).await;
    let absence = engine
        .absence_service
        .create(
            &absence_template(user.id, AbsenceType::OvertimeComp, comp_day, comp_day),
            Authentication::Full,
            None,
        )
        .await
        .unwrap();
    engine
        .absence_service
        .approve(absence.id, Authentication::Full, None)
        .await
        .unwrap();

    assert!((balance(&engine, user.id).await - 2.0).abs() < 1e-3);
    let rows = ledger(&engine, user.id, comp_day, comp_day).await;
    assert!(rows
        .iter()
        .any(|row| row.transaction_type == TransactionType::Compensation
            && (row.hours + 8.0).abs() < 1e-3));
    assert_running_sum(&engine, user.id).await;
}

#[tokio::test]
async fn test_overlapping_absences_are_rejected() {
    let engine = setup().await;
    let user = create_employee(&engine, "erika.m").await;

    engine
        .absence_service
        .create(
            &absence_template(
                user.id,
                AbsenceType::Vacation,
                date!(2025 - 08 - 04),
                date!(2025 - 08 - 08),
            ),
            Authentication::Full,
            None,
        )
        .await
        .unwrap();
    let result = engine
        .absence_service
        .create(
            &absence_template(
                user.id,
                AbsenceType::Unpaid,
                date!(2025 - 08 - 08),
                date!(2025 - 08 - 11),
            ),
            Authentication::Full,
            None,
        )
        .await;
    assert!(matches!(result, Err(ServiceError::OverlappingAbsence)));
}

#[tokio::test]
async fn test_absence_on_non_working_days_fails() {
    let engine = setup().await;
    let user = create_employee(&engine, "erika.m").await;

    // A weekend-only request has no business days.
    let result = engine
        .absence_service
        .create(
            &absence_template(
                user.id,
                AbsenceType::Vacation,
                date!(2025 - 08 - 02),
                date!(2025 - 08 - 03),
            ),
            Authentication::Full,
            None,
        )
        .await;
    assert!(matches!(result, Err(ServiceError::NoWorkingDays)));
}

#[tokio::test]
async fn test_holiday_overrides_part_time_schedule() {
    let engine = setup().await;
    let mut template = user_template("erika.m");
    template.weekly_hours = 8.0;
    template.work_schedule = Some(WeekSchedule {
        monday: 4.0,
        tuesday: 4.0,
        ..WeekSchedule::default()
    });
    let user = engine
        .user_service
        .create(&template, Authentication::Full, None)
        .await
        .unwrap();

    engine
        .holiday_service
        .create(
            &Holiday {
                date: date!(2026 - 01 - 06),
                name: "Heilige Drei Könige".into(),
                federal: false,
            },
            Authentication::Full,
            None,
        )
        .await
        .unwrap();

    // The active days of January outside the vacation range.
    for date in [
        date!(2026 - 01 - 19),
        date!(2026 - 01 - 20),
        date!(2026 - 01 - 26),
        date!(2026 - 01 - 27),
    ] {
        log_hours(&engine, user.id, date, 4.0).await;
    }

    let absence = engine
        .absence_service
        .create(
            &absence_template(
                user.id,
                AbsenceType::Vacation,
                date!(2026 - 01 - 05),
                date!(2026 - 01 - 13),
            ),
            Authentication::Full,
            None,
        )
        .await
        .unwrap();
    // Mon 05, Mon 12, Tue 13; the holiday on Tue 06 is excluded.
    assert_eq!(absence.days, 3.0);

    engine
        .absence_service
        .approve(absence.id, Authentication::Full, None)
        .await
        .unwrap();
    assert!(balance(&engine, user.id).await.abs() < 1e-3);

    // No rows on the holiday itself.
    let rows = ledger(&engine, user.id, date!(2026 - 01 - 06), date!(2026 - 01 - 06)).await;
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_working_on_holiday_is_pure_overtime() {
    let engine = setup().await;
    let user = create_employee(&engine, "erika.m").await;

    engine
        .holiday_service
        .create(
            &Holiday {
                date: date!(2026 - 01 - 01),
                name: "Neujahr".into(),
                federal: true,
            },
            Authentication::Full,
            None,
        )
        .await
        .unwrap();

    let january = KontoMonth::from_date(date!(2026 - 01 - 01));
    log_workdays(&engine, user.id, january, &[date!(2026 - 01 - 01)]).await;
    log_hours(&engine, user.id, date!(2026 - 01 - 01), 8.0).await;

    assert!((balance(&engine, user.id).await - 8.0).abs() < 1e-3);
}

#[tokio::test]
async fn test_corrections_flow_into_the_ledger() {
    let engine = setup().await;
    let admin = create_admin(&engine, "hr.admin").await;
    let user = create_employee(&engine, "erika.m").await;

    log_workdays(&engine, user.id, june_25(), &[]).await;
    let correction = engine
        .overtime_correction_service
        .create(
            &OvertimeCorrection {
                id: Uuid::nil(),
                user_id: user.id,
                date: date!(2025 - 06 - 07),
                hours: 2.5,
                reason: "Migration from the old tracking sheet".into(),
                correction_type: CorrectionType::Migration,
                created_by: admin.id,
                created: None,
                deleted: None,
                version: Uuid::nil(),
            },
            Authentication::Full,
            None,
        )
        .await
        .unwrap();
    assert!((balance(&engine, user.id).await - 2.5).abs() < 1e-3);

    engine
        .overtime_correction_service
        .delete(correction.id, Authentication::Full, None)
        .await
        .unwrap();
    assert!(balance(&engine, user.id).await.abs() < 1e-3);
}

#[tokio::test]
async fn test_correction_validation() {
    let engine = setup().await;
    let user = create_employee(&engine, "erika.m").await;

    let mut correction = OvertimeCorrection {
        id: Uuid::nil(),
        user_id: user.id,
        date: date!(2025 - 06 - 07),
        hours: 0.0,
        reason: "A sufficiently long reason".into(),
        correction_type: CorrectionType::Manual,
        created_by: user.id,
        created: None,
        deleted: None,
        version: Uuid::nil(),
    };
    let result = engine
        .overtime_correction_service
        .create(&correction, Authentication::Full, None)
        .await;
    assert!(matches!(result, Err(ServiceError::ZeroHours)));

    correction.hours = 1.0;
    correction.reason = "short".into();
    let result = engine
        .overtime_correction_service
        .create(&correction, Authentication::Full, None)
        .await;
    assert!(matches!(result, Err(ServiceError::ReasonTooShort)));
}

#[tokio::test]
async fn test_rebuild_is_idempotent() {
    let engine = setup().await;
    let user = create_employee(&engine, "erika.m").await;

    let vacation_days = [date!(2025 - 06 - 09), date!(2025 - 06 - 10)];
    log_workdays(&engine, user.id, june_25(), &vacation_days).await;
    log_hours(&engine, user.id, date!(2025 - 06 - 07), 4.0).await;
    let absence = engine
        .absence_service
        .create(
            &absence_template(user.id, AbsenceType::Vacation, vacation_days[0], vacation_days[1]),
            Authentication::Full,
            None,
        )
        .await
        .unwrap();
    engine
        .absence_service
        .approve(absence.id, Authentication::Full, None)
        .await
        .unwrap();

    let snapshot = |rows: Arc<[service::overtime::OvertimeTransaction]>| {
        rows.iter()
            .map(|row| {
                (
                    row.date,
                    row.transaction_type,
                    (row.hours * 100.0).round() as i64,
                    (row.balance_before * 100.0).round() as i64,
                    (row.balance_after * 100.0).round() as i64,
                )
            })
            .collect::<Vec<_>>()
    };

    let first = snapshot(ledger(&engine, user.id, date!(2025 - 06 - 01), date!(2025 - 06 - 30)).await);
    assert!(!first.is_empty());

    engine
        .overtime_service
        .rebuild_month(user.id, june_25(), Authentication::Full, None)
        .await
        .unwrap();
    engine
        .overtime_service
        .rebuild_month(user.id, june_25(), Authentication::Full, None)
        .await
        .unwrap();

    let second = snapshot(ledger(&engine, user.id, date!(2025 - 06 - 01), date!(2025 - 06 - 30)).await);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_year_end_rollover() {
    let engine = setup().await;
    let admin = create_admin(&engine, "hr.admin").await;
    let user = create_employee(&engine, "erika.m").await;

    let november = KontoMonth::from_date(date!(2025 - 11 - 01));
    log_workdays(&engine, user.id, november, &[]).await;
    engine
        .overtime_correction_service
        .create(
            &OvertimeCorrection {
                id: Uuid::nil(),
                user_id: user.id,
                date: date!(2025 - 11 - 01),
                hours: 12.5,
                reason: "Balance taken over from payroll".into(),
                correction_type: CorrectionType::Migration,
                created_by: admin.id,
                created: None,
                deleted: None,
                version: Uuid::nil(),
            },
            Authentication::Full,
            None,
        )
        .await
        .unwrap();

    let preview = engine
        .rollover_service
        .preview(2025, Authentication::Full, None)
        .await
        .unwrap();
    let preview_entry = preview
        .iter()
        .find(|entry| entry.user_id == user.id)
        .unwrap();
    assert!((preview_entry.overtime_carryover - 12.5).abs() < 1e-3);
    // Preview must not persist anything.
    let report = engine
        .overtime_service
        .monthly_report(user.id, 2026, Some(1), Authentication::Full, None)
        .await
        .unwrap();
    assert!(report.is_empty());

    engine
        .rollover_service
        .perform(2025, Authentication::Full, None)
        .await
        .unwrap();

    let report = engine
        .overtime_service
        .monthly_report(user.id, 2026, Some(1), Authentication::Full, None)
        .await
        .unwrap();
    assert!((report[0].carryover_from_previous_year - 12.5).abs() < 1e-3);

    let breakdown = engine
        .overtime_service
        .year_breakdown(user.id, 2026, Authentication::Full, None)
        .await
        .unwrap();
    assert!((breakdown.carryover - 12.5).abs() < 1e-3);

    // Unused vacation carries over capped at five days by default.
    let vacation = engine
        .vacation_service
        .balance_for_year(user.id, 2026, Authentication::Full, None)
        .await
        .unwrap();
    assert!((vacation.carryover - 5.0).abs() < 1e-3);
    assert!((vacation.entitlement - 30.0).abs() < 1e-3);
}

#[tokio::test]
async fn test_hire_date_bounds_target_accrual() {
    let engine = setup().await;
    let mut template = user_template("erika.m");
    // Hired mid-month on a Monday.
    template.hire_date = date!(2025 - 06 - 16);
    let user = engine
        .user_service
        .create(&template, Authentication::Full, None)
        .await
        .unwrap();

    // Entries before the hire date are refused.
    let result = engine
        .time_entry_service
        .create(
            &entry_template(user.id, date!(2025 - 06 - 02), 8.0),
            Authentication::Full,
            None,
        )
        .await;
    assert!(matches!(result, Err(ServiceError::BeforeHireDate)));

    log_hours(&engine, user.id, date!(2025 - 06 - 16), 8.0).await;
    let report = engine
        .overtime_service
        .monthly_report(user.id, 2025, Some(6), Authentication::Full, None)
        .await
        .unwrap();
    // Eleven workdays remain from June 16.
    assert!((report[0].target_hours - 11.0 * 8.0).abs() < 1e-3);
}

use crate::gen_service_impl;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dao::{
    absence::{AbsenceDao, AbsenceEntity},
    holiday::HolidayDao,
    overtime_correction::OvertimeCorrectionDao,
    overtime_month::{OvertimeMonthDao, OvertimeMonthEntity},
    overtime_transaction::{OvertimeTransactionDao, OvertimeTransactionEntity},
    time_entry::TimeEntryDao,
    user::UserDao,
    TransactionDao,
};
use service::{
    absence::AbsenceType,
    clock::ClockService,
    overtime::{OvertimeMonth, OvertimeService, OvertimeTransaction, TransactionType, YearBreakdown},
    permission::{Authentication, ADMIN_PRIVILEGE},
    user::User,
    working_time::{calculate_day, credit_hours, day_ledger_events, HolidayCalendar},
    PermissionService, ServiceError,
};
use tokio::join;
use tracing::debug;
use uuid::Uuid;
use zeitkonto_utils::{round_hours, KontoMonth};

pub const ABSENCE_REFERENCE: &str = "absence";

gen_service_impl! {
    struct OvertimeServiceImpl: OvertimeService = OvertimeServiceDeps {
        UserDao: UserDao<Transaction = Self::Transaction> = user_dao,
        TimeEntryDao: TimeEntryDao<Transaction = Self::Transaction> = time_entry_dao,
        AbsenceDao: AbsenceDao<Transaction = Self::Transaction> = absence_dao,
        OvertimeCorrectionDao: OvertimeCorrectionDao<Transaction = Self::Transaction> = overtime_correction_dao,
        HolidayDao: HolidayDao<Transaction = Self::Transaction> = holiday_dao,
        OvertimeTransactionDao: OvertimeTransactionDao<Transaction = Self::Transaction> = overtime_transaction_dao,
        OvertimeMonthDao: OvertimeMonthDao<Transaction = Self::Transaction> = overtime_month_dao,
        PermissionService: PermissionService<Context = Self::Context> = permission_service,
        ClockService: ClockService = clock_service,
        TransactionDao: TransactionDao<Transaction = Self::Transaction> = transaction_dao,
    }
}

fn describe(transaction_type: TransactionType, date: time::Date) -> Arc<str> {
    match transaction_type {
        TransactionType::Earned => format!("Daily result for {date}"),
        TransactionType::VacationCredit => format!("Vacation credit for {date}"),
        TransactionType::SickCredit => format!("Sick leave credit for {date}"),
        TransactionType::OvertimeCompCredit => {
            format!("Overtime compensation credit for {date}")
        }
        TransactionType::UnpaidAdjustment => format!("Unpaid leave adjustment for {date}"),
        TransactionType::Correction => format!("Manual corrections for {date}"),
        TransactionType::Compensation => format!("Overtime compensation on {date}"),
    }
    .into()
}

impl<Deps: OvertimeServiceDeps> OvertimeServiceImpl<Deps> {
    async fn check_admin_or_self(
        &self,
        user_id: Uuid,
        context: Authentication<Deps::Context>,
        tx: Deps::Transaction,
    ) -> Result<(), ServiceError> {
        let user = self.load_user(user_id, tx).await?;
        let (admin_permission, self_permission) = join!(
            self.permission_service
                .check_permission(ADMIN_PRIVILEGE, context.clone()),
            self.permission_service
                .check_user(user.username.as_ref(), context),
        );
        admin_permission.or(self_permission)
    }

    async fn check_rebuild_permission(
        &self,
        context: Authentication<Deps::Context>,
    ) -> Result<(), ServiceError> {
        let (full, admin_permission) = join!(
            self.permission_service
                .check_only_full_authentication(context.clone()),
            self.permission_service
                .check_permission(ADMIN_PRIVILEGE, context),
        );
        full.or(admin_permission)
    }

    async fn load_user(
        &self,
        user_id: Uuid,
        tx: Deps::Transaction,
    ) -> Result<User, ServiceError> {
        Ok(User::from(
            &self
                .user_dao
                .find_by_id(user_id, tx)
                .await?
                .filter(|user| user.deleted.is_none())
                .ok_or(ServiceError::EntityNotFound(user_id))?,
        ))
    }

    /// Single-month rebuild running inside the caller's transaction.
    async fn rebuild_month_in_tx(
        &self,
        user: &User,
        month: KontoMonth,
        tx: Deps::Transaction,
    ) -> Result<(), ServiceError> {
        let first = month.first_day();
        let last = month.last_day();
        let today = self.clock_service.today();

        // Window of days that actually accrue target hours: clamped to the
        // employment window and never reaching past today.
        let window_start = first.max(user.hire_date);
        let mut window_end = last.min(today);
        if let Some(end_date) = user.end_date {
            window_end = window_end.min(end_date);
        }

        self.overtime_transaction_dao
            .delete_month(user.id, month, tx.clone())
            .await?;

        let mut running = self
            .overtime_transaction_dao
            .find_latest_before(user.id, first, tx.clone())
            .await?
            .map(|row| row.balance_after)
            .unwrap_or(0.0);

        let mut worked_by_date: HashMap<time::Date, f32> = HashMap::new();
        for entry in self
            .time_entry_dao
            .find_by_user_in_range(user.id, first, last, tx.clone())
            .await?
            .iter()
            .filter(|entry| entry.deleted.is_none())
        {
            *worked_by_date.entry(entry.date).or_insert(0.0) += entry.hours;
        }

        let mut corrections_by_date: HashMap<time::Date, f32> = HashMap::new();
        for correction in self
            .overtime_correction_dao
            .find_by_user_in_range(user.id, first, last, tx.clone())
            .await?
            .iter()
            .filter(|correction| correction.deleted.is_none())
        {
            *corrections_by_date.entry(correction.date).or_insert(0.0) += correction.hours;
        }

        let absences: Vec<AbsenceEntity> = self
            .absence_dao
            .find_approved_in_range(user.id, first, last, tx.clone())
            .await?
            .iter()
            .filter(|absence| absence.deleted.is_none())
            .cloned()
            .collect();

        // Compensation hours are computed over the full absence span, so the
        // holiday calendar has to cover it as well.
        let calendar_start = absences
            .iter()
            .map(|absence| absence.start_date)
            .fold(first, |a, b| a.min(b));
        let calendar_end = absences
            .iter()
            .map(|absence| absence.end_date)
            .fold(last, |a, b| a.max(b));
        let holidays: HolidayCalendar = self
            .holiday_dao
            .find_in_range(calendar_start, calendar_end, tx.clone())
            .await?
            .iter()
            .map(|holiday| holiday.date)
            .collect();

        let created = self.clock_service.date_time_now();
        let mut target_sum = 0.0f32;
        let mut actual_sum = 0.0f32;

        for date in month.days() {
            if date >= window_start && date <= window_end {
                let worked = worked_by_date.get(&date).copied().unwrap_or(0.0);
                let corrections = corrections_by_date.get(&date).copied().unwrap_or(0.0);
                let absence = absences.iter().find(|absence| absence.overlaps(date, date));
                let absence_type = absence.map(|absence| AbsenceType::from(&absence.absence_type));

                let day = calculate_day(user, date, worked, absence_type, corrections, &holidays);
                target_sum += day.target_hours - day.breakdown.unpaid_reduction;
                actual_sum += day.actual_hours;

                for event in day_ledger_events(&day, absence_type) {
                    let hours = round_hours(event.hours);
                    let is_absence_row = matches!(
                        event.transaction_type,
                        TransactionType::VacationCredit
                            | TransactionType::SickCredit
                            | TransactionType::OvertimeCompCredit
                            | TransactionType::UnpaidAdjustment
                    );
                    let entity = OvertimeTransactionEntity {
                        id: 0,
                        user_id: user.id,
                        date,
                        transaction_type: (&event.transaction_type).into(),
                        hours,
                        balance_before: running,
                        balance_after: running + hours,
                        description: describe(event.transaction_type, date),
                        reference_type: is_absence_row.then(|| ABSENCE_REFERENCE.into()),
                        reference_id: is_absence_row
                            .then(|| absence.map(|absence| absence.id))
                            .flatten(),
                        created,
                    };
                    self.overtime_transaction_dao
                        .create(&entity, "overtime_service::rebuild", tx.clone())
                        .await?;
                    running += hours;
                }
            }

            // Approved overtime compensation anchors its one-off deduction at
            // the start date, regenerated here so rebuilds stay idempotent.
            for absence in absences.iter().filter(|absence| {
                absence.start_date == date
                    && absence.absence_type == dao::absence::AbsenceTypeEntity::OvertimeComp
            }) {
                let hours = round_hours(credit_hours(
                    user,
                    absence.start_date,
                    absence.end_date,
                    AbsenceType::OvertimeComp,
                    &holidays,
                ));
                if hours == 0.0 {
                    continue;
                }
                let entity = OvertimeTransactionEntity {
                    id: 0,
                    user_id: user.id,
                    date,
                    transaction_type: dao::overtime_transaction::TransactionTypeEntity::Compensation,
                    hours: -hours,
                    balance_before: running,
                    balance_after: running - hours,
                    description: format!(
                        "Overtime compensation {} to {}",
                        absence.start_date, absence.end_date
                    )
                    .into(),
                    reference_type: Some(ABSENCE_REFERENCE.into()),
                    reference_id: Some(absence.id),
                    created,
                };
                self.overtime_transaction_dao
                    .create(&entity, "overtime_service::rebuild", tx.clone())
                    .await?;
                running -= hours;
            }
        }

        let target_hours = round_hours(target_sum);
        let actual_hours = round_hours(actual_sum);
        self.overtime_month_dao
            .upsert(
                &OvertimeMonthEntity {
                    user_id: user.id,
                    month,
                    target_hours,
                    actual_hours,
                    overtime: round_hours(actual_hours - target_hours),
                    carryover_from_previous_year: 0.0,
                },
                "overtime_service::rebuild",
                tx.clone(),
            )
            .await?;

        debug!(
            "Rebuilt {month} for {}: target {target_hours}, actual {actual_hours}",
            user.id
        );
        Ok(())
    }
}

#[async_trait]
impl<Deps: OvertimeServiceDeps> OvertimeService for OvertimeServiceImpl<Deps> {
    type Context = Deps::Context;
    type Transaction = Deps::Transaction;

    async fn rebuild_month(
        &self,
        user_id: Uuid,
        month: KontoMonth,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError> {
        self.check_rebuild_permission(context).await?;
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let user = self.load_user(user_id, tx.clone()).await?;
        self.rebuild_month_in_tx(&user, month, tx.clone()).await?;
        self.transaction_dao.commit(tx).await?;
        Ok(())
    }

    async fn rebuild_months(
        &self,
        user_id: Uuid,
        from: KontoMonth,
        to: KontoMonth,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError> {
        self.check_rebuild_permission(context).await?;
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let user = self.load_user(user_id, tx.clone()).await?;
        for month in from.iter_until(&to) {
            self.rebuild_month_in_tx(&user, month, tx.clone()).await?;
        }
        self.transaction_dao.commit(tx).await?;
        Ok(())
    }

    async fn balance(
        &self,
        user_id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<f32, ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;
        self.check_admin_or_self(user_id, context, tx.clone())
            .await?;
        let balance = self
            .overtime_transaction_dao
            .find_latest(user_id, tx.clone())
            .await?
            .map(|row| row.balance_after)
            .unwrap_or(0.0);
        self.transaction_dao.commit(tx).await?;
        Ok(balance)
    }

    async fn balance_at(
        &self,
        user_id: Uuid,
        date: time::Date,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<f32, ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;
        self.check_admin_or_self(user_id, context, tx.clone())
            .await?;
        let balance = self
            .overtime_transaction_dao
            .find_latest_on_or_before(user_id, date, tx.clone())
            .await?
            .map(|row| row.balance_after)
            .unwrap_or(0.0);
        self.transaction_dao.commit(tx).await?;
        Ok(balance)
    }

    async fn transactions_in_range(
        &self,
        user_id: Uuid,
        from: time::Date,
        to: time::Date,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[OvertimeTransaction]>, ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;
        self.check_admin_or_self(user_id, context, tx.clone())
            .await?;
        let transactions: Arc<[OvertimeTransaction]> = self
            .overtime_transaction_dao
            .find_by_user_in_range(user_id, from, to, tx.clone())
            .await?
            .iter()
            .map(OvertimeTransaction::from)
            .collect();
        self.transaction_dao.commit(tx).await?;
        Ok(transactions)
    }

    async fn monthly_report(
        &self,
        user_id: Uuid,
        year: i32,
        month: Option<u8>,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[OvertimeMonth]>, ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;
        self.check_admin_or_self(user_id, context, tx.clone())
            .await?;
        let months: Arc<[OvertimeMonth]> = match month {
            Some(month) => {
                let month = KontoMonth::new(year, month)
                    .map_err(|err| ServiceError::ValidationError(err.to_string().into()))?;
                self.overtime_month_dao
                    .find_by_user_and_month(user_id, month, tx.clone())
                    .await?
                    .iter()
                    .map(OvertimeMonth::from)
                    .collect()
            }
            None => self
                .overtime_month_dao
                .find_by_user_and_year(user_id, year, tx.clone())
                .await?
                .iter()
                .map(OvertimeMonth::from)
                .collect(),
        };
        self.transaction_dao.commit(tx).await?;
        Ok(months)
    }

    async fn year_breakdown(
        &self,
        user_id: Uuid,
        year: i32,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<YearBreakdown, ServiceError> {
        let tx = self.transaction_dao.use_transaction(tx).await?;
        self.check_admin_or_self(user_id, context, tx.clone())
            .await?;

        let today = self.clock_service.today();
        let months: Arc<[OvertimeMonth]> = self
            .overtime_month_dao
            .find_by_user_and_year(user_id, year, tx.clone())
            .await?
            .iter()
            .map(OvertimeMonth::from)
            .filter(|month| year != today.year() || month.month <= KontoMonth::from_date(today))
            .collect();
        self.transaction_dao.commit(tx).await?;

        let carryover = months
            .iter()
            .find(|month| month.month.month() == 1)
            .map(|month| month.carryover_from_previous_year)
            .unwrap_or(0.0);
        let total = carryover + months.iter().map(|month| month.overtime).sum::<f32>();
        Ok(YearBreakdown {
            year,
            carryover,
            months,
            total: round_hours(total),
        })
    }
}

use crate::gen_service_impl;
use std::sync::Arc;

use async_trait::async_trait;
use dao::{
    absence::{AbsenceDao, AbsenceStatusEntity, AbsenceTypeEntity},
    overtime_month::OvertimeMonthDao,
    user::{UserDao, UserStatusEntity},
    vacation_balance::VacationBalanceDao,
    TransactionDao,
};
use serde_json::json;
use service::{
    audit::AuditService,
    config::{ConfigService, VacationCarryoverPolicy},
    overtime::OvertimeService,
    permission::{Authentication, ADMIN_PRIVILEGE},
    rollover::{RolloverEntry, RolloverService},
    vacation::VacationService,
    PermissionService, ServiceError,
};
use tokio::join;
use tracing::info;
use zeitkonto_utils::KontoMonth;

gen_service_impl! {
    struct RolloverServiceImpl: RolloverService = RolloverServiceDeps {
        UserDao: UserDao<Transaction = Self::Transaction> = user_dao,
        AbsenceDao: AbsenceDao<Transaction = Self::Transaction> = absence_dao,
        VacationBalanceDao: VacationBalanceDao<Transaction = Self::Transaction> = vacation_balance_dao,
        OvertimeMonthDao: OvertimeMonthDao<Transaction = Self::Transaction> = overtime_month_dao,
        OvertimeService: OvertimeService<Context = Self::Context, Transaction = Self::Transaction> = overtime_service,
        VacationService: VacationService<Context = Self::Context, Transaction = Self::Transaction> = vacation_service,
        ConfigService: ConfigService = config_service,
        PermissionService: PermissionService<Context = Self::Context> = permission_service,
        AuditService: AuditService = audit_service,
        TransactionDao: TransactionDao<Transaction = Self::Transaction> = transaction_dao,
    }
}

fn last_day_of(year: i32) -> time::Date {
    time::Date::from_calendar_date(year, time::Month::December, 31)
        .expect("December 31st always exists")
}

impl<Deps: RolloverServiceDeps> RolloverServiceImpl<Deps> {
    async fn check_rollover_permission(
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

    /// Year-end snapshot of every active user, without persisting anything.
    async fn compute_entries(
        &self,
        year: i32,
        tx: Deps::Transaction,
    ) -> Result<Vec<RolloverEntry>, ServiceError> {
        let policy = self.config_service.get_config().await?.vacation_carryover_policy;
        let users = self.user_dao.all(tx.clone()).await?;
        let mut entries = Vec::new();
        for user in users
            .iter()
            .filter(|user| user.deleted.is_none())
            .filter(|user| user.status == UserStatusEntity::Active)
        {
            let overtime_carryover = self
                .overtime_service
                .balance_at(
                    user.id,
                    last_day_of(year),
                    Authentication::Full,
                    tx.clone().into(),
                )
                .await?;

            let stored = self
                .vacation_balance_dao
                .find_by_user_and_year(user.id, year, tx.clone())
                .await?;
            let entitlement = stored
                .as_ref()
                .map(|stored| stored.entitlement)
                .unwrap_or(user.vacation_days_per_year as f32);
            let carryover = stored.as_ref().map(|stored| stored.carryover).unwrap_or(0.0);
            let taken: f32 = self
                .absence_dao
                .find_by_user(user.id, tx.clone())
                .await?
                .iter()
                .filter(|absence| absence.deleted.is_none())
                .filter(|absence| absence.absence_type == AbsenceTypeEntity::Vacation)
                .filter(|absence| absence.status == AbsenceStatusEntity::Approved)
                .filter(|absence| absence.start_date.year() == year)
                .map(|absence| absence.days)
                .sum();
            let vacation_remaining = (entitlement + carryover - taken).max(0.0);
            let vacation_carryover = match policy {
                VacationCarryoverPolicy::Capped5 => vacation_remaining.min(5.0),
                VacationCarryoverPolicy::Unlimited => vacation_remaining,
            };

            entries.push(RolloverEntry {
                user_id: user.id,
                username: user.username.clone(),
                overtime_carryover,
                vacation_remaining,
                vacation_carryover,
            });
        }
        Ok(entries)
    }
}

#[async_trait]
impl<Deps: RolloverServiceDeps> RolloverService for RolloverServiceImpl<Deps> {
    type Context = Deps::Context;
    type Transaction = Deps::Transaction;

    async fn perform(
        &self,
        year: i32,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[RolloverEntry]>, ServiceError> {
        self.check_rollover_permission(context.clone()).await?;
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let entries = self.compute_entries(year, tx.clone()).await?;
        let january = KontoMonth::new(year + 1, 1)
            .map_err(|err| ServiceError::ValidationError(err.to_string().into()))?;

        for entry in &entries {
            self.overtime_month_dao
                .set_carryover(
                    entry.user_id,
                    january,
                    entry.overtime_carryover,
                    "rollover_service::perform",
                    tx.clone(),
                )
                .await?;
            self.vacation_service
                .set_carryover(
                    entry.user_id,
                    year + 1,
                    entry.vacation_carryover,
                    Authentication::Full,
                    tx.clone().into(),
                )
                .await?;
            self.audit_service
                .record(
                    None,
                    "rollover.perform",
                    "user",
                    entry.user_id.to_string().into(),
                    json!({
                        "year": year,
                        "overtimeCarryover": entry.overtime_carryover,
                        "vacationCarryover": entry.vacation_carryover,
                    }),
                )
                .await;
        }
        self.transaction_dao.commit(tx).await?;
        info!("Year-end rollover {year} -> {} for {} users", year + 1, entries.len());
        Ok(entries.into())
    }

    async fn preview(
        &self,
        year: i32,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[RolloverEntry]>, ServiceError> {
        self.check_rollover_permission(context).await?;
        let tx = self.transaction_dao.use_transaction(tx).await?;
        let entries = self.compute_entries(year, tx.clone()).await?;
        self.transaction_dao.commit(tx).await?;
        Ok(entries.into())
    }
}

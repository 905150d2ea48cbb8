use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;
use zeitkonto_utils::{derive_from_reference, KontoMonth};

use crate::permission::Authentication;
use crate::ServiceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Earned,
    VacationCredit,
    SickCredit,
    OvertimeCompCredit,
    UnpaidAdjustment,
    Correction,
    Compensation,
}

impl From<&dao::overtime_transaction::TransactionTypeEntity> for TransactionType {
    fn from(value: &dao::overtime_transaction::TransactionTypeEntity) -> Self {
        use dao::overtime_transaction::TransactionTypeEntity as E;
        match value {
            E::Earned => Self::Earned,
            E::VacationCredit => Self::VacationCredit,
            E::SickCredit => Self::SickCredit,
            E::OvertimeCompCredit => Self::OvertimeCompCredit,
            E::UnpaidAdjustment => Self::UnpaidAdjustment,
            E::Correction => Self::Correction,
            E::Compensation => Self::Compensation,
        }
    }
}
impl From<&TransactionType> for dao::overtime_transaction::TransactionTypeEntity {
    fn from(value: &TransactionType) -> Self {
        use dao::overtime_transaction::TransactionTypeEntity as E;
        match value {
            TransactionType::Earned => E::Earned,
            TransactionType::VacationCredit => E::VacationCredit,
            TransactionType::SickCredit => E::SickCredit,
            TransactionType::OvertimeCompCredit => E::OvertimeCompCredit,
            TransactionType::UnpaidAdjustment => E::UnpaidAdjustment,
            TransactionType::Correction => E::Correction,
            TransactionType::Compensation => E::Compensation,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OvertimeTransaction {
    pub id: i64,
    pub user_id: Uuid,
    pub date: time::Date,
    pub transaction_type: TransactionType,
    pub hours: f32,
    pub balance_before: f32,
    pub balance_after: f32,
    pub description: Arc<str>,
    pub reference_type: Option<Arc<str>>,
    pub reference_id: Option<Uuid>,
    pub created: Option<time::PrimitiveDateTime>,
}

impl From<&dao::overtime_transaction::OvertimeTransactionEntity> for OvertimeTransaction {
    fn from(entity: &dao::overtime_transaction::OvertimeTransactionEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            date: entity.date,
            transaction_type: (&entity.transaction_type).into(),
            hours: entity.hours,
            balance_before: entity.balance_before,
            balance_after: entity.balance_after,
            description: entity.description.clone(),
            reference_type: entity.reference_type.clone(),
            reference_id: entity.reference_id,
            created: Some(entity.created),
        }
    }
}
derive_from_reference!(
    dao::overtime_transaction::OvertimeTransactionEntity,
    OvertimeTransaction
);

#[derive(Clone, Debug, PartialEq)]
pub struct OvertimeMonth {
    pub user_id: Uuid,
    pub month: KontoMonth,
    pub target_hours: f32,
    pub actual_hours: f32,
    pub overtime: f32,
    pub carryover_from_previous_year: f32,
}

impl From<&dao::overtime_month::OvertimeMonthEntity> for OvertimeMonth {
    fn from(entity: &dao::overtime_month::OvertimeMonthEntity) -> Self {
        Self {
            user_id: entity.user_id,
            month: entity.month,
            target_hours: entity.target_hours,
            actual_hours: entity.actual_hours,
            overtime: entity.overtime,
            carryover_from_previous_year: entity.carryover_from_previous_year,
        }
    }
}
derive_from_reference!(dao::overtime_month::OvertimeMonthEntity, OvertimeMonth);

/// Yearly view: prior-year carry-over, the monthly projections up to the
/// requested point, and the resulting running total.
#[derive(Clone, Debug, PartialEq)]
pub struct YearBreakdown {
    pub year: i32,
    pub carryover: f32,
    pub months: Arc<[OvertimeMonth]>,
    pub total: f32,
}

#[automock(type Context=(); type Transaction=dao::MockTransaction;)]
#[async_trait]
pub trait OvertimeService {
    type Context: Clone + Debug + PartialEq + Eq + Send + Sync + 'static;
    type Transaction: dao::Transaction;

    /// Idempotent, atomic rebuild of the user's ledger rows and monthly
    /// projection for `month` from the source facts.
    async fn rebuild_month(
        &self,
        user_id: Uuid,
        month: KontoMonth,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError>;

    /// Rebuilds every month `[from, to]`, ascending.
    async fn rebuild_months(
        &self,
        user_id: Uuid,
        from: KontoMonth,
        to: KontoMonth,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError>;

    /// `balance_after` of the user's latest ledger row.
    async fn balance(
        &self,
        user_id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<f32, ServiceError>;

    /// `balance_after` of the latest ledger row dated on or before `date`.
    async fn balance_at(
        &self,
        user_id: Uuid,
        date: time::Date,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<f32, ServiceError>;

    async fn transactions_in_range(
        &self,
        user_id: Uuid,
        from: time::Date,
        to: time::Date,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[OvertimeTransaction]>, ServiceError>;

    /// Projection rows of the year, or only of `month` when given.
    async fn monthly_report(
        &self,
        user_id: Uuid,
        year: i32,
        month: Option<u8>,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[OvertimeMonth]>, ServiceError>;

    async fn year_breakdown(
        &self,
        user_id: Uuid,
        year: i32,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<YearBreakdown, ServiceError>;
}

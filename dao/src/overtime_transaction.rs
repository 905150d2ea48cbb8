use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;
use zeitkonto_utils::KontoMonth;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionTypeEntity {
    Earned,
    VacationCredit,
    SickCredit,
    OvertimeCompCredit,
    UnpaidAdjustment,
    Correction,
    Compensation,
}

/// Append-only ledger row.  `id` is assigned by the store on insert and,
/// together with `date`, fixes the running-sum order.
#[derive(Clone, Debug, PartialEq)]
pub struct OvertimeTransactionEntity {
    pub id: i64,
    pub user_id: Uuid,
    pub date: time::Date,
    pub transaction_type: TransactionTypeEntity,
    pub hours: f32,
    pub balance_before: f32,
    pub balance_after: f32,
    pub description: Arc<str>,
    pub reference_type: Option<Arc<str>>,
    pub reference_id: Option<Uuid>,
    pub created: time::PrimitiveDateTime,
}

#[automock(type Transaction = crate::MockTransaction;)]
#[async_trait]
pub trait OvertimeTransactionDao {
    type Transaction: crate::Transaction;

    /// Rows of the user ordered by `(date, id)` ascending.
    async fn find_by_user_in_range(
        &self,
        user_id: Uuid,
        from: time::Date,
        to: time::Date,
        tx: Self::Transaction,
    ) -> Result<Arc<[OvertimeTransactionEntity]>, crate::DaoError>;
    /// Latest row with `date <= date`, by `(date, id)` descending.
    async fn find_latest_on_or_before(
        &self,
        user_id: Uuid,
        date: time::Date,
        tx: Self::Transaction,
    ) -> Result<Option<OvertimeTransactionEntity>, crate::DaoError>;
    /// Latest row with `date < date`, by `(date, id)` descending.
    async fn find_latest_before(
        &self,
        user_id: Uuid,
        date: time::Date,
        tx: Self::Transaction,
    ) -> Result<Option<OvertimeTransactionEntity>, crate::DaoError>;
    async fn find_latest(
        &self,
        user_id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Option<OvertimeTransactionEntity>, crate::DaoError>;
    async fn delete_month(
        &self,
        user_id: Uuid,
        month: KontoMonth,
        tx: Self::Transaction,
    ) -> Result<(), crate::DaoError>;
    /// Inserts and returns the store-assigned row id.
    async fn create(
        &self,
        entity: &OvertimeTransactionEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<i64, crate::DaoError>;
}

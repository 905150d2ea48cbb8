use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;
use zeitkonto_utils::KontoMonth;

/// Materialized per-(user, month) aggregate, rebuilt by the recompute
/// orchestrator.  `overtime` always equals `actual_hours - target_hours`.
#[derive(Clone, Debug, PartialEq)]
pub struct OvertimeMonthEntity {
    pub user_id: Uuid,
    pub month: KontoMonth,
    pub target_hours: f32,
    pub actual_hours: f32,
    pub overtime: f32,
    pub carryover_from_previous_year: f32,
}

#[automock(type Transaction = crate::MockTransaction;)]
#[async_trait]
pub trait OvertimeMonthDao {
    type Transaction: crate::Transaction;

    async fn find_by_user_and_month(
        &self,
        user_id: Uuid,
        month: KontoMonth,
        tx: Self::Transaction,
    ) -> Result<Option<OvertimeMonthEntity>, crate::DaoError>;
    /// All months of the calendar year, ascending.
    async fn find_by_user_and_year(
        &self,
        user_id: Uuid,
        year: i32,
        tx: Self::Transaction,
    ) -> Result<Arc<[OvertimeMonthEntity]>, crate::DaoError>;
    /// Insert or replace the aggregate columns; `carryover_from_previous_year`
    /// is preserved when the row already exists.
    async fn upsert(
        &self,
        entity: &OvertimeMonthEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), crate::DaoError>;
    async fn set_carryover(
        &self,
        user_id: Uuid,
        month: KontoMonth,
        carryover: f32,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), crate::DaoError>;
}

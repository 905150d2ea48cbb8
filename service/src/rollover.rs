use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::permission::Authentication;
use crate::ServiceError;

/// Per-user outcome of a year-end rollover run.
#[derive(Clone, Debug, PartialEq)]
pub struct RolloverEntry {
    pub user_id: Uuid,
    pub username: Arc<str>,
    pub overtime_carryover: f32,
    pub vacation_remaining: f32,
    pub vacation_carryover: f32,
}

#[automock(type Context=(); type Transaction=dao::MockTransaction;)]
#[async_trait]
pub trait RolloverService {
    type Context: Clone + Debug + PartialEq + Eq + Send + Sync + 'static;
    type Transaction: dao::Transaction;

    /// Snapshots every active user's year-end balances into the next year.
    /// All users are written in one transaction.
    async fn perform(
        &self,
        year: i32,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[RolloverEntry]>, ServiceError>;

    /// Computes the same entries without persisting anything.
    async fn preview(
        &self,
        year: i32,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[RolloverEntry]>, ServiceError>;
}

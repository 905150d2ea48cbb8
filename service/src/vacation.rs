use std::fmt::Debug;

use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::permission::Authentication;
use crate::ServiceError;

/// Vacation account of a (user, year).  `taken` and `pending` are derived
/// from absence rows; `remaining` ignores pending requests.
#[derive(Clone, Debug, PartialEq)]
pub struct VacationBalance {
    pub user_id: Uuid,
    pub year: i32,
    pub entitlement: f32,
    pub carryover: f32,
    pub taken: f32,
    pub pending: f32,
}

impl VacationBalance {
    pub fn remaining(&self) -> f32 {
        self.entitlement + self.carryover - self.taken
    }
}

#[automock(type Context=(); type Transaction=dao::MockTransaction;)]
#[async_trait]
pub trait VacationService {
    type Context: Clone + Debug + PartialEq + Eq + Send + Sync + 'static;
    type Transaction: dao::Transaction;

    /// Balance of the year, initializing the stored account from the user's
    /// entitlement (and, policy permitting, the previous year's remainder)
    /// on first access.
    async fn balance_for_year(
        &self,
        user_id: Uuid,
        year: i32,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<VacationBalance, ServiceError>;

    /// Writes the carry-over of `year`, used by the year-end rollover.
    async fn set_carryover(
        &self,
        user_id: Uuid,
        year: i32,
        carryover: f32,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError>;
}

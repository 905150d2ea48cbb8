use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

/// Per-(user, year) vacation account.  Taken and pending day counts are
/// derived from absence rows at read time and are not stored here.
#[derive(Clone, Debug, PartialEq)]
pub struct VacationBalanceEntity {
    pub user_id: Uuid,
    pub year: i32,
    pub entitlement: f32,
    pub carryover: f32,
}

#[automock(type Transaction = crate::MockTransaction;)]
#[async_trait]
pub trait VacationBalanceDao {
    type Transaction: crate::Transaction;

    async fn find_by_user_and_year(
        &self,
        user_id: Uuid,
        year: i32,
        tx: Self::Transaction,
    ) -> Result<Option<VacationBalanceEntity>, crate::DaoError>;
    async fn upsert(
        &self,
        entity: &VacationBalanceEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), crate::DaoError>;
}

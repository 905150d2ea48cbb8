use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;

/// Public holiday, unique by civil date.
#[derive(Clone, Debug, PartialEq)]
pub struct HolidayEntity {
    pub date: time::Date,
    pub name: Arc<str>,
    pub federal: bool,
}

#[automock(type Transaction = crate::MockTransaction;)]
#[async_trait]
pub trait HolidayDao {
    type Transaction: crate::Transaction;

    async fn find_by_date(
        &self,
        date: time::Date,
        tx: Self::Transaction,
    ) -> Result<Option<HolidayEntity>, crate::DaoError>;
    async fn find_in_range(
        &self,
        from: time::Date,
        to: time::Date,
        tx: Self::Transaction,
    ) -> Result<Arc<[HolidayEntity]>, crate::DaoError>;
    async fn upsert(
        &self,
        entity: &HolidayEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), crate::DaoError>;
    async fn delete(
        &self,
        date: time::Date,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), crate::DaoError>;
}

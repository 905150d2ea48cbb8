use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;
use zeitkonto_utils::KontoMonth;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkLocationEntity {
    Office,
    HomeOffice,
    Field,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimeEntryEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: time::Date,
    pub hours: f32,
    pub break_minutes: u32,
    pub start_time: Option<time::Time>,
    pub end_time: Option<time::Time>,
    pub location: WorkLocationEntity,
    pub created: time::PrimitiveDateTime,
    pub deleted: Option<time::PrimitiveDateTime>,
    pub version: Uuid,
}

impl TimeEntryEntity {
    pub fn as_month(&self) -> KontoMonth {
        KontoMonth::from_date(self.date)
    }
}

#[automock(type Transaction = crate::MockTransaction;)]
#[async_trait]
pub trait TimeEntryDao {
    type Transaction: crate::Transaction;

    async fn find_by_id(
        &self,
        id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Option<TimeEntryEntity>, crate::DaoError>;
    async fn find_by_user_and_date(
        &self,
        user_id: Uuid,
        date: time::Date,
        tx: Self::Transaction,
    ) -> Result<Arc<[TimeEntryEntity]>, crate::DaoError>;
    async fn find_by_user_in_range(
        &self,
        user_id: Uuid,
        from: time::Date,
        to: time::Date,
        tx: Self::Transaction,
    ) -> Result<Arc<[TimeEntryEntity]>, crate::DaoError>;
    async fn create(
        &self,
        entity: &TimeEntryEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), crate::DaoError>;
    async fn update(
        &self,
        entity: &TimeEntryEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), crate::DaoError>;
}

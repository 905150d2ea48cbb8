use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorrectionTypeEntity {
    SystemError,
    AbsenceCredit,
    Migration,
    Manual,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OvertimeCorrectionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: time::Date,
    pub hours: f32,
    pub reason: Arc<str>,
    pub correction_type: CorrectionTypeEntity,
    pub created_by: Uuid,
    pub created: time::PrimitiveDateTime,
    pub deleted: Option<time::PrimitiveDateTime>,
    pub version: Uuid,
}

#[automock(type Transaction = crate::MockTransaction;)]
#[async_trait]
pub trait OvertimeCorrectionDao {
    type Transaction: crate::Transaction;

    async fn find_by_id(
        &self,
        id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Option<OvertimeCorrectionEntity>, crate::DaoError>;
    async fn find_by_user_in_range(
        &self,
        user_id: Uuid,
        from: time::Date,
        to: time::Date,
        tx: Self::Transaction,
    ) -> Result<Arc<[OvertimeCorrectionEntity]>, crate::DaoError>;
    async fn create(
        &self,
        entity: &OvertimeCorrectionEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), crate::DaoError>;
    async fn update(
        &self,
        entity: &OvertimeCorrectionEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), crate::DaoError>;
}

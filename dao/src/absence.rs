use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbsenceTypeEntity {
    Vacation,
    Sick,
    Unpaid,
    OvertimeComp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbsenceStatusEntity {
    Pending,
    Approved,
    Rejected,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AbsenceEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub absence_type: AbsenceTypeEntity,
    pub start_date: time::Date,
    pub end_date: time::Date,
    /// Schedule-aware business-day count, fixed at creation.
    pub days: f32,
    pub status: AbsenceStatusEntity,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<time::PrimitiveDateTime>,
    pub reason: Option<Arc<str>>,
    pub created: time::PrimitiveDateTime,
    pub deleted: Option<time::PrimitiveDateTime>,
    pub version: Uuid,
}

impl AbsenceEntity {
    pub fn overlaps(&self, from: time::Date, to: time::Date) -> bool {
        self.start_date <= to && self.end_date >= from
    }
}

#[automock(type Transaction = crate::MockTransaction;)]
#[async_trait]
pub trait AbsenceDao {
    type Transaction: crate::Transaction;

    async fn find_by_id(
        &self,
        id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Option<AbsenceEntity>, crate::DaoError>;
    async fn find_by_user(
        &self,
        user_id: Uuid,
        tx: Self::Transaction,
    ) -> Result<Arc<[AbsenceEntity]>, crate::DaoError>;
    /// Non-rejected absences touching `[from, to]`.
    async fn find_overlapping(
        &self,
        user_id: Uuid,
        from: time::Date,
        to: time::Date,
        tx: Self::Transaction,
    ) -> Result<Arc<[AbsenceEntity]>, crate::DaoError>;
    /// Approved absences touching `[from, to]`.
    async fn find_approved_in_range(
        &self,
        user_id: Uuid,
        from: time::Date,
        to: time::Date,
        tx: Self::Transaction,
    ) -> Result<Arc<[AbsenceEntity]>, crate::DaoError>;
    async fn create(
        &self,
        entity: &AbsenceEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), crate::DaoError>;
    async fn update(
        &self,
        entity: &AbsenceEntity,
        process: &str,
        tx: Self::Transaction,
    ) -> Result<(), crate::DaoError>;
}

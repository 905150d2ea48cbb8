use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;
use zeitkonto_utils::{derive_from_reference, KontoMonth};

use crate::permission::Authentication;
use crate::ServiceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AbsenceType {
    Vacation,
    Sick,
    Unpaid,
    OvertimeComp,
}

impl AbsenceType {
    /// Paid absences credit the day's target hours; unpaid leave reduces the
    /// target instead.
    pub fn is_paid(&self) -> bool {
        !matches!(self, AbsenceType::Unpaid)
    }

    /// Whether holidays count as absence days (an employee can be sick on a
    /// holiday; unpaid leave is independent of holidays).
    pub fn counts_holidays(&self) -> bool {
        matches!(self, AbsenceType::Sick | AbsenceType::Unpaid)
    }

    /// Sick leave is recorded without approval workflow.
    pub fn auto_approves(&self) -> bool {
        matches!(self, AbsenceType::Sick)
    }

    /// Sick absences co-exist with time entries already logged; all other
    /// types exclude them.
    pub fn excludes_time_entries(&self) -> bool {
        !matches!(self, AbsenceType::Sick)
    }
}

impl From<&dao::absence::AbsenceTypeEntity> for AbsenceType {
    fn from(value: &dao::absence::AbsenceTypeEntity) -> Self {
        match value {
            dao::absence::AbsenceTypeEntity::Vacation => Self::Vacation,
            dao::absence::AbsenceTypeEntity::Sick => Self::Sick,
            dao::absence::AbsenceTypeEntity::Unpaid => Self::Unpaid,
            dao::absence::AbsenceTypeEntity::OvertimeComp => Self::OvertimeComp,
        }
    }
}
impl From<&AbsenceType> for dao::absence::AbsenceTypeEntity {
    fn from(value: &AbsenceType) -> Self {
        match value {
            AbsenceType::Vacation => Self::Vacation,
            AbsenceType::Sick => Self::Sick,
            AbsenceType::Unpaid => Self::Unpaid,
            AbsenceType::OvertimeComp => Self::OvertimeComp,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbsenceStatus {
    Pending,
    Approved,
    Rejected,
}
impl From<&dao::absence::AbsenceStatusEntity> for AbsenceStatus {
    fn from(value: &dao::absence::AbsenceStatusEntity) -> Self {
        match value {
            dao::absence::AbsenceStatusEntity::Pending => Self::Pending,
            dao::absence::AbsenceStatusEntity::Approved => Self::Approved,
            dao::absence::AbsenceStatusEntity::Rejected => Self::Rejected,
        }
    }
}
impl From<&AbsenceStatus> for dao::absence::AbsenceStatusEntity {
    fn from(value: &AbsenceStatus) -> Self {
        match value {
            AbsenceStatus::Pending => Self::Pending,
            AbsenceStatus::Approved => Self::Approved,
            AbsenceStatus::Rejected => Self::Rejected,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Absence {
    pub id: Uuid,
    pub user_id: Uuid,
    pub absence_type: AbsenceType,
    pub start_date: time::Date,
    pub end_date: time::Date,
    pub days: f32,
    pub status: AbsenceStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<time::PrimitiveDateTime>,
    pub reason: Option<Arc<str>>,
    pub created: Option<time::PrimitiveDateTime>,
    pub deleted: Option<time::PrimitiveDateTime>,
    pub version: Uuid,
}

impl Absence {
    /// Months the absence range touches, ascending.
    pub fn months(&self) -> Vec<KontoMonth> {
        KontoMonth::from_date(self.start_date)
            .iter_until(&KontoMonth::from_date(self.end_date))
            .collect()
    }
}

impl From<&dao::absence::AbsenceEntity> for Absence {
    fn from(entity: &dao::absence::AbsenceEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            absence_type: (&entity.absence_type).into(),
            start_date: entity.start_date,
            end_date: entity.end_date,
            days: entity.days,
            status: (&entity.status).into(),
            approved_by: entity.approved_by,
            approved_at: entity.approved_at,
            reason: entity.reason.clone(),
            created: Some(entity.created),
            deleted: entity.deleted,
            version: entity.version,
        }
    }
}
derive_from_reference!(dao::absence::AbsenceEntity, Absence);

impl TryFrom<&Absence> for dao::absence::AbsenceEntity {
    type Error = ServiceError;
    fn try_from(absence: &Absence) -> Result<Self, Self::Error> {
        Ok(Self {
            id: absence.id,
            user_id: absence.user_id,
            absence_type: (&absence.absence_type).into(),
            start_date: absence.start_date,
            end_date: absence.end_date,
            days: absence.days,
            status: (&absence.status).into(),
            approved_by: absence.approved_by,
            approved_at: absence.approved_at,
            reason: absence.reason.clone(),
            created: absence.created.ok_or(ServiceError::InternalError)?,
            deleted: absence.deleted,
            version: absence.version,
        })
    }
}

#[automock(type Context=(); type Transaction=dao::MockTransaction;)]
#[async_trait]
pub trait AbsenceService {
    type Context: Clone + Debug + PartialEq + Eq + Send + Sync + 'static;
    type Transaction: dao::Transaction;

    async fn get(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Absence, ServiceError>;

    async fn get_all_for_user(
        &self,
        user_id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[Absence]>, ServiceError>;

    async fn find_approved_in_range(
        &self,
        user_id: Uuid,
        from: time::Date,
        to: time::Date,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[Absence]>, ServiceError>;

    /// Validates the request per the state-machine guards.  Sick absences
    /// are approved (and accounted) immediately.
    async fn create(
        &self,
        absence: &Absence,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Absence, ServiceError>;

    /// Replaces dates, type and reason of a still-pending request; the
    /// creation guards run again against the new values.
    async fn update(
        &self,
        absence: &Absence,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Absence, ServiceError>;

    /// `pending -> approved` and `rejected -> approved` (re-approval).
    async fn approve(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Absence, ServiceError>;

    /// `pending -> rejected` and `approved -> rejected` (cancellation).
    async fn reject(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Absence, ServiceError>;

    async fn delete(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError>;
}

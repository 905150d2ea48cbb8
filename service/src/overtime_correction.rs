use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;
use zeitkonto_utils::derive_from_reference;

use crate::permission::Authentication;
use crate::ServiceError;

pub const MIN_REASON_LEN: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorrectionType {
    SystemError,
    AbsenceCredit,
    Migration,
    Manual,
}
impl From<&dao::overtime_correction::CorrectionTypeEntity> for CorrectionType {
    fn from(value: &dao::overtime_correction::CorrectionTypeEntity) -> Self {
        match value {
            dao::overtime_correction::CorrectionTypeEntity::SystemError => Self::SystemError,
            dao::overtime_correction::CorrectionTypeEntity::AbsenceCredit => Self::AbsenceCredit,
            dao::overtime_correction::CorrectionTypeEntity::Migration => Self::Migration,
            dao::overtime_correction::CorrectionTypeEntity::Manual => Self::Manual,
        }
    }
}
impl From<&CorrectionType> for dao::overtime_correction::CorrectionTypeEntity {
    fn from(value: &CorrectionType) -> Self {
        match value {
            CorrectionType::SystemError => Self::SystemError,
            CorrectionType::AbsenceCredit => Self::AbsenceCredit,
            CorrectionType::Migration => Self::Migration,
            CorrectionType::Manual => Self::Manual,
        }
    }
}

/// Manual balance correction, immutable once created.
#[derive(Clone, Debug, PartialEq)]
pub struct OvertimeCorrection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: time::Date,
    pub hours: f32,
    pub reason: Arc<str>,
    pub correction_type: CorrectionType,
    pub created_by: Uuid,
    pub created: Option<time::PrimitiveDateTime>,
    pub deleted: Option<time::PrimitiveDateTime>,
    pub version: Uuid,
}

impl From<&dao::overtime_correction::OvertimeCorrectionEntity> for OvertimeCorrection {
    fn from(entity: &dao::overtime_correction::OvertimeCorrectionEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            date: entity.date,
            hours: entity.hours,
            reason: entity.reason.clone(),
            correction_type: (&entity.correction_type).into(),
            created_by: entity.created_by,
            created: Some(entity.created),
            deleted: entity.deleted,
            version: entity.version,
        }
    }
}
derive_from_reference!(
    dao::overtime_correction::OvertimeCorrectionEntity,
    OvertimeCorrection
);

impl TryFrom<&OvertimeCorrection> for dao::overtime_correction::OvertimeCorrectionEntity {
    type Error = ServiceError;
    fn try_from(correction: &OvertimeCorrection) -> Result<Self, Self::Error> {
        Ok(Self {
            id: correction.id,
            user_id: correction.user_id,
            date: correction.date,
            hours: correction.hours,
            reason: correction.reason.clone(),
            correction_type: (&correction.correction_type).into(),
            created_by: correction.created_by,
            created: correction.created.ok_or(ServiceError::InternalError)?,
            deleted: correction.deleted,
            version: correction.version,
        })
    }
}

#[automock(type Context=(); type Transaction=dao::MockTransaction;)]
#[async_trait]
pub trait OvertimeCorrectionService {
    type Context: Clone + Debug + PartialEq + Eq + Send + Sync + 'static;
    type Transaction: dao::Transaction;

    async fn find_by_user_in_range(
        &self,
        user_id: Uuid,
        from: time::Date,
        to: time::Date,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[OvertimeCorrection]>, ServiceError>;

    /// Admin only; rejects zero hours and reasons shorter than
    /// [`MIN_REASON_LEN`]; rebuilds the correction's month.
    async fn create(
        &self,
        correction: &OvertimeCorrection,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<OvertimeCorrection, ServiceError>;

    /// Admin only; rebuilds the correction's month.
    async fn delete(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError>;
}

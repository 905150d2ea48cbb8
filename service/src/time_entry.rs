use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;
use zeitkonto_utils::{derive_from_reference, KontoMonth};

use crate::permission::Authentication;
use crate::ServiceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkLocation {
    Office,
    HomeOffice,
    Field,
}
impl From<&dao::time_entry::WorkLocationEntity> for WorkLocation {
    fn from(location: &dao::time_entry::WorkLocationEntity) -> Self {
        match location {
            dao::time_entry::WorkLocationEntity::Office => Self::Office,
            dao::time_entry::WorkLocationEntity::HomeOffice => Self::HomeOffice,
            dao::time_entry::WorkLocationEntity::Field => Self::Field,
        }
    }
}
impl From<&WorkLocation> for dao::time_entry::WorkLocationEntity {
    fn from(location: &WorkLocation) -> Self {
        match location {
            WorkLocation::Office => Self::Office,
            WorkLocation::HomeOffice => Self::HomeOffice,
            WorkLocation::Field => Self::Field,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimeEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: time::Date,
    pub hours: f32,
    pub break_minutes: u32,
    pub start_time: Option<time::Time>,
    pub end_time: Option<time::Time>,
    pub location: WorkLocation,
    pub created: Option<time::PrimitiveDateTime>,
    pub deleted: Option<time::PrimitiveDateTime>,
    pub version: Uuid,
}

impl TimeEntry {
    pub fn as_month(&self) -> KontoMonth {
        KontoMonth::from_date(self.date)
    }
}

impl From<&dao::time_entry::TimeEntryEntity> for TimeEntry {
    fn from(entity: &dao::time_entry::TimeEntryEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            date: entity.date,
            hours: entity.hours,
            break_minutes: entity.break_minutes,
            start_time: entity.start_time,
            end_time: entity.end_time,
            location: (&entity.location).into(),
            created: Some(entity.created),
            deleted: entity.deleted,
            version: entity.version,
        }
    }
}
derive_from_reference!(dao::time_entry::TimeEntryEntity, TimeEntry);

impl TryFrom<&TimeEntry> for dao::time_entry::TimeEntryEntity {
    type Error = ServiceError;
    fn try_from(entry: &TimeEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entry.id,
            user_id: entry.user_id,
            date: entry.date,
            hours: entry.hours,
            break_minutes: entry.break_minutes,
            start_time: entry.start_time,
            end_time: entry.end_time,
            location: (&entry.location).into(),
            created: entry.created.ok_or(ServiceError::InternalError)?,
            deleted: entry.deleted,
            version: entry.version,
        })
    }
}

#[automock(type Context=(); type Transaction=dao::MockTransaction;)]
#[async_trait]
pub trait TimeEntryService {
    type Context: Clone + Debug + PartialEq + Eq + Send + Sync + 'static;
    type Transaction: dao::Transaction;

    async fn find_by_user_in_range(
        &self,
        user_id: Uuid,
        from: time::Date,
        to: time::Date,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<Arc<[TimeEntry]>, ServiceError>;

    /// Rejects dates covered by an approved non-sick absence and dates
    /// outside the employment window; rebuilds the entry's month.
    async fn create(
        &self,
        entry: &TimeEntry,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<TimeEntry, ServiceError>;

    async fn update(
        &self,
        entry: &TimeEntry,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<TimeEntry, ServiceError>;

    async fn delete(
        &self,
        id: Uuid,
        context: Authentication<Self::Context>,
        tx: Option<Self::Transaction>,
    ) -> Result<(), ServiceError>;
}

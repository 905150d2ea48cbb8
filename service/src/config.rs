use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;

use crate::ServiceError;

/// How many vacation days survive the year-end rollover.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VacationCarryoverPolicy {
    /// At most five remaining days are carried into the next year.
    Capped5,
    Unlimited,
}

/// What happens to time entries in the range of an absence being approved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbsenceConflictPolicy {
    /// Conflicting entries are deleted and the rebuild proceeds.
    DeleteTimeEntries,
    /// The approval is refused while conflicting entries exist.
    RejectApproval,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub timezone: Arc<str>,
    pub vacation_carryover_policy: VacationCarryoverPolicy,
    pub absence_conflict_policy: AbsenceConflictPolicy,
}

#[automock]
#[async_trait]
pub trait ConfigService {
    async fn get_config(&self) -> Result<Config, ServiceError>;
}

use std::fmt::Debug;

use async_trait::async_trait;

use crate::ServiceError;

#[async_trait]
pub trait SchedulerService {
    type Context: Clone + Debug + PartialEq + Eq + Send + Sync + 'static;

    /// Registers the recurring jobs, currently the year-end rollover run
    /// in the night of January 1.
    async fn start(&self) -> Result<(), ServiceError>;
}

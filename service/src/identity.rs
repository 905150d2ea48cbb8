use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;

use crate::ServiceError;

/// Source of the authenticated caller's username.  The real implementation
/// lives at the session boundary; a development stub ships with the engine.
#[automock]
#[async_trait]
pub trait IdentityService {
    async fn current_username(&self) -> Result<Arc<str>, ServiceError>;
}

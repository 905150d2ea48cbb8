use std::sync::Arc;

use async_trait::async_trait;
use service::identity::IdentityService;
use service::ServiceError;

/// Development identity: every request runs as one fixed username.
pub struct IdentityServiceDev {
    username: Arc<str>,
}

impl IdentityServiceDev {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.into(),
        }
    }
}

impl Default for IdentityServiceDev {
    fn default() -> Self {
        Self::new("DEVUSER")
    }
}

#[async_trait]
impl IdentityService for IdentityServiceDev {
    async fn current_username(&self) -> Result<Arc<str>, ServiceError> {
        Ok(self.username.clone())
    }
}

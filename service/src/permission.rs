use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;

use crate::ServiceError;

pub const ADMIN_PRIVILEGE: &str = "admin";
pub const EMPLOYEE_PRIVILEGE: &str = "employee";

/// For mocking the context locally since there is actually
/// no context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockContext;

/// Caller identity attached to every service call.  `Full` marks internal
/// calls which bypass permission checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Authentication<Context: Clone + PartialEq + Eq + Send + Sync + Debug + 'static> {
    Full,
    Context(Context),
}
impl<Context: Clone + Debug + PartialEq + Eq + Send + Sync + 'static> From<Context>
    for Authentication<Context>
{
    fn from(context: Context) -> Self {
        Self::Context(context)
    }
}

#[automock(type Context=();)]
#[async_trait]
pub trait PermissionService {
    type Context: Clone + PartialEq + Eq + Debug + Send + Sync + 'static;

    /// Username of the caller, `None` for full authentication.
    async fn current_username(
        &self,
        context: Authentication<Self::Context>,
    ) -> Result<Option<Arc<str>>, ServiceError>;
    async fn check_permission(
        &self,
        privilege: &str,
        context: Authentication<Self::Context>,
    ) -> Result<(), ServiceError>;
    async fn check_only_full_authentication(
        &self,
        context: Authentication<Self::Context>,
    ) -> Result<(), ServiceError>;
    async fn check_user(
        &self,
        username: &str,
        context: Authentication<Self::Context>,
    ) -> Result<(), ServiceError>;
}

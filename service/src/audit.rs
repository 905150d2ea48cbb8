use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

/// Best-effort audit trail.  Recording failures are logged, never
/// propagated into the calling transaction.
#[automock]
#[async_trait]
pub trait AuditService {
    async fn record(
        &self,
        actor_id: Option<Uuid>,
        action: &str,
        entity: &str,
        entity_id: Arc<str>,
        diff: serde_json::Value,
    );
}

use std::sync::Arc;

use async_trait::async_trait;
use service::audit::AuditService;
use tracing::info;
use uuid::Uuid;

/// Audit sink writing structured log events; persistence of the audit trail
/// lives outside the engine.
pub struct TracingAuditService;

#[async_trait]
impl AuditService for TracingAuditService {
    async fn record(
        &self,
        actor_id: Option<Uuid>,
        action: &str,
        entity: &str,
        entity_id: Arc<str>,
        diff: serde_json::Value,
    ) {
        info!(?actor_id, action, entity, %entity_id, %diff, "audit");
    }
}

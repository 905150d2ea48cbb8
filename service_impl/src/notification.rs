use async_trait::async_trait;
use service::notification::{NotificationKind, Notifier};
use tracing::info;
use uuid::Uuid;

/// Notifier that only writes structured log events.  Stands in until a real
/// delivery channel is wired up at the system boundary.
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn emit(&self, user_id: Uuid, kind: NotificationKind, payload: serde_json::Value) {
        info!(%user_id, ?kind, %payload, "notification");
    }
}

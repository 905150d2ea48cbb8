use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    AbsenceApproved,
    AbsenceRejected,
    TimeEntriesDeleted,
    YearEndRollover,
}

/// Best-effort notification sink.  Implementations must not fail the
/// calling operation; delivery errors are swallowed and logged.
#[automock]
#[async_trait]
pub trait Notifier {
    async fn emit(&self, user_id: Uuid, kind: NotificationKind, payload: serde_json::Value);
}

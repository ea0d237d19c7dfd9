use axum::async_trait;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::notifications::repo::NotificationKind;

#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub data: Value,
}

/// Fire-and-forget delivery channel keyed by user id. The transport itself
/// (push, websocket, ...) lives outside this service; failures must never
/// affect the request that triggered the event.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, user_id: Uuid, event: &NotificationEvent) -> anyhow::Result<()>;
}

/// Default delivery: structured log line only.
#[derive(Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, user_id: Uuid, event: &NotificationEvent) -> anyhow::Result<()> {
        info!(
            user_id = %user_id,
            kind = ?event.kind,
            title = %event.title,
            "notification emitted"
        );
        Ok(())
    }
}

use axum::{
    routing::{get, post},
    Router,
};
use tracing::warn;
use uuid::Uuid;

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod notifier;
pub mod repo;

pub use notifier::NotificationEvent;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications",
            get(handlers::list_my).post(handlers::create),
        )
        .route("/notifications/:id/read", post(handlers::mark_read))
        .route("/notifications/read-all", post(handlers::mark_all_read))
}

/// Persist and deliver a notification; both steps are best-effort and never
/// raise past this call site.
pub async fn emit_best_effort(state: &AppState, user_id: Uuid, event: NotificationEvent) {
    match repo::insert(
        &state.db,
        user_id,
        event.kind,
        &event.title,
        &event.message,
        &event.data,
    )
    .await
    {
        Ok(saved) => {
            if let Err(e) = state.notifier.deliver(user_id, &event).await {
                warn!(error = %e, user_id = %user_id, notification_id = %saved.id,
                      "notification delivery failed");
            }
        }
        Err(e) => {
            warn!(error = %e, user_id = %user_id, "notification write failed");
        }
    }
}

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::ApiError,
    notifications::{
        dto::{CreateNotificationRequest, MarkAllReadResponse, NotificationListQuery},
        notifier::NotificationEvent,
        repo::{self, Notification},
    },
    pagination::{PageQuery, Paginated},
    state::AppState,
};

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateNotificationRequest>,
) -> Result<Json<Notification>, ApiError> {
    if payload.title.trim().is_empty() || payload.message.trim().is_empty() {
        return Err(ApiError::validation("title and message are required"));
    }

    let saved = repo::insert(
        &state.db,
        user_id,
        payload.kind,
        payload.title.trim(),
        payload.message.trim(),
        &payload.data,
    )
    .await?;

    // Delivery is best-effort; the stored row is the source of truth.
    let event = NotificationEvent {
        kind: saved.kind,
        title: saved.title.clone(),
        message: saved.message.clone(),
        data: saved.data.clone(),
    };
    if let Err(e) = state.notifier.deliver(user_id, &event).await {
        warn!(error = %e, user_id = %user_id, "notification delivery failed");
    }

    Ok(Json(saved))
}

#[instrument(skip(state))]
pub async fn list_my(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(page): Query<PageQuery>,
    Query(filter): Query<NotificationListQuery>,
) -> Result<Json<Paginated<Notification>>, ApiError> {
    let page = page.validated();
    let total = repo::count_by_user(&state.db, user_id, filter.unread_only).await?;
    let items = repo::list_by_user(&state.db, user_id, &page, filter.unread_only).await?;
    Ok(Json(Paginated::new(items, &page, total)))
}

#[instrument(skip(state))]
pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    let updated = repo::mark_read(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("notification"))?;
    Ok(Json(updated))
}

#[instrument(skip(state))]
pub async fn mark_all_read(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let modified = repo::mark_all_read(&state.db, user_id).await?;
    Ok(Json(MarkAllReadResponse { modified }))
}

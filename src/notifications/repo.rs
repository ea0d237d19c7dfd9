use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::pagination::PageQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum NotificationKind {
    PremiumSuccess,
    MealPlanCreated,
    WeeklyKcalSummary,
    Generic,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub data: Value,
    pub read: bool,
    pub created_at: OffsetDateTime,
}

const COLUMNS: &str = "id, user_id, kind, title, message, data, read, created_at";

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    kind: NotificationKind,
    title: &str,
    message: &str,
    data: &Value,
) -> anyhow::Result<Notification> {
    let row = sqlx::query_as::<_, Notification>(&format!(
        "INSERT INTO notifications (user_id, kind, title, message, data)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {COLUMNS}"
    ))
    .bind(user_id)
    .bind(kind)
    .bind(title)
    .bind(message)
    .bind(data)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    page: &PageQuery,
    unread_only: bool,
) -> anyhow::Result<Vec<Notification>> {
    let rows = sqlx::query_as::<_, Notification>(&format!(
        "SELECT {COLUMNS} FROM notifications
         WHERE user_id = $1 AND (NOT $2 OR read = FALSE)
         ORDER BY created_at DESC
         LIMIT $3 OFFSET $4"
    ))
    .bind(user_id)
    .bind(unread_only)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count_by_user(db: &PgPool, user_id: Uuid, unread_only: bool) -> anyhow::Result<i64> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications
         WHERE user_id = $1 AND (NOT $2 OR read = FALSE)",
    )
    .bind(user_id)
    .bind(unread_only)
    .fetch_one(db)
    .await?;
    Ok(total)
}

/// Mark one notification read; scoped to the owner.
pub async fn mark_read(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> anyhow::Result<Option<Notification>> {
    let row = sqlx::query_as::<_, Notification>(&format!(
        "UPDATE notifications SET read = TRUE
         WHERE id = $1 AND user_id = $2
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Mark everything read, returning the number of rows touched.
pub async fn mark_all_read(db: &PgPool, user_id: Uuid) -> anyhow::Result<u64> {
    let result = sqlx::query(
        "UPDATE notifications SET read = TRUE WHERE user_id = $1 AND read = FALSE",
    )
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

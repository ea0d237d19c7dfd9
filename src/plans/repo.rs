use serde::Serialize;
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::pagination::PageQuery;
use crate::recommend::dto::{PlanInput, PlanResult};

/// One computed plan. Append-only: created once per planning request, never
/// mutated, retained indefinitely for history queries.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MealPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub input: Json<PlanInput>,
    pub result: Json<PlanResult>,
    pub created_at: OffsetDateTime,
}

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    input: &PlanInput,
    result: &PlanResult,
) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO meal_plans (user_id, input, result) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(Json(input))
        .bind(Json(result))
        .execute(db)
        .await?;
    Ok(())
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    page: &PageQuery,
) -> anyhow::Result<Vec<MealPlan>> {
    let rows = sqlx::query_as::<_, MealPlan>(
        "SELECT id, user_id, input, result, created_at
         FROM meal_plans
         WHERE user_id = $1
         ORDER BY created_at DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(user_id)
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn latest_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<MealPlan>> {
    let row = sqlx::query_as::<_, MealPlan>(
        "SELECT id, user_id, input, result, created_at
         FROM meal_plans
         WHERE user_id = $1
         ORDER BY created_at DESC
         LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn count_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM meal_plans WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await?;
    Ok(total)
}

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::instrument;

use crate::{
    auth::AuthUser,
    error::ApiError,
    pagination::{PageQuery, Paginated},
    plans::repo::{self, MealPlan},
    state::AppState,
};

#[instrument(skip(state))]
pub async fn plan_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<MealPlan>>, ApiError> {
    let page = page.validated();
    let total = repo::count_by_user(&state.db, user_id).await?;
    let items = repo::list_by_user(&state.db, user_id, &page).await?;
    Ok(Json(Paginated::new(items, &page, total)))
}

#[instrument(skip(state))]
pub async fn latest_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MealPlan>, ApiError> {
    let plan = repo::latest_by_user(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("no meal plan yet".into()))?;
    Ok(Json(plan))
}

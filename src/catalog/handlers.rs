use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{handlers::require_admin, AuthUser},
    catalog::{
        dto::{CreateCategoryRequest, CreateIngredientRequest, CreateSubCategoryRequest},
        repo::{Category, Ingredient, SubCategory},
    },
    error::ApiError,
    pagination::{PageQuery, Paginated},
    state::AppState,
};

pub fn ingredient_routes() -> Router<AppState> {
    Router::new()
        .route("/ingredients", get(list_ingredients).post(create_ingredient))
        .route("/ingredients/:id", get(get_ingredient))
}

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/subcategories",
            get(list_sub_categories).post(create_sub_category),
        )
}

#[instrument(skip(state))]
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<Ingredient>>, ApiError> {
    let page = page.validated();
    let total = Ingredient::count(&state.db).await?;
    let items = Ingredient::list(&state.db, &page).await?;
    Ok(Json(Paginated::new(items, &page, total)))
}

#[instrument(skip(state))]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Ingredient>, ApiError> {
    let ingredient = Ingredient::find_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("ingredient"))?;
    Ok(Json(ingredient))
}

#[instrument(skip(state, payload))]
pub async fn create_ingredient(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(payload): Json<CreateIngredientRequest>,
) -> Result<Json<Ingredient>, ApiError> {
    require_admin(&state, caller).await?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name is required"));
    }
    if Ingredient::find_by_name(&state.db, name).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "ingredient '{name}' already exists"
        )));
    }

    let ingredient = Ingredient::create(
        &state.db,
        name,
        &payload.unit,
        &payload.kind,
        payload.kcal,
        payload.image_url.as_deref(),
    )
    .await?;
    info!(id = %ingredient.id, name = %ingredient.name, "ingredient created");
    Ok(Json(ingredient))
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(Category::list(&state.db).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_category(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    require_admin(&state, caller).await?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name is required"));
    }
    if Category::find_by_name(&state.db, name).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "category '{name}' already exists"
        )));
    }

    let category = Category::create(&state.db, name, payload.description.as_deref()).await?;
    info!(id = %category.id, name = %category.name, "category created");
    Ok(Json(category))
}

#[instrument(skip(state))]
pub async fn list_sub_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<SubCategory>>, ApiError> {
    Ok(Json(SubCategory::list(&state.db).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_sub_category(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(payload): Json<CreateSubCategoryRequest>,
) -> Result<Json<SubCategory>, ApiError> {
    require_admin(&state, caller).await?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name is required"));
    }

    let category = match (payload.category_id, payload.category_name.as_deref()) {
        (Some(id), _) => Category::find_by_id(&state.db, id).await?,
        (None, Some(cat_name)) => Category::find_by_name(&state.db, cat_name).await?,
        (None, None) => {
            return Err(ApiError::validation(
                "category_id or category_name is required",
            ))
        }
    }
    .ok_or_else(|| ApiError::not_found("category"))?;

    if SubCategory::find_by_name(&state.db, name).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "subcategory '{name}' already exists"
        )));
    }

    let sub = SubCategory::create(&state.db, name, category.id).await?;
    info!(id = %sub.id, name = %sub.name, "subcategory created");
    Ok(Json(sub))
}

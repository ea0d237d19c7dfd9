use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{handlers::require_admin, AuthUser},
    catalog::repo::{Category, Ingredient, SubCategory},
    error::ApiError,
    meals::{
        dto::{CreateMealRequest, MealDetails, UpdateMealRequest},
        repo::{Meal, MealTime, MealUpdate, NewMeal},
    },
    pagination::{PageQuery, Paginated},
    state::AppState,
};

const MEAL_LIST_CACHE_TTL: Duration = Duration::from_secs(120);

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals))
        .route("/meals/:id", get(get_meal))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", axum::routing::post(create_meal))
        .route(
            "/meals/:id",
            axum::routing::put(update_meal).delete(delete_meal),
        )
}

/// Resolve an ingredient reference (catalog id or name) to its stored id.
async fn resolve_ingredient_id(db: &PgPool, value: &str) -> Result<String, ApiError> {
    if let Some(found) = Ingredient::find_by_id(db, value).await? {
        return Ok(found.id);
    }
    if let Some(found) = Ingredient::find_by_name(db, value).await? {
        return Ok(found.id);
    }
    Err(ApiError::NotFound(format!(
        "ingredient not found for value '{value}'"
    )))
}

async fn resolve_category_id(db: &PgPool, value: &str) -> Result<Uuid, ApiError> {
    if let Ok(id) = value.parse::<Uuid>() {
        if let Some(found) = Category::find_by_id(db, id).await? {
            return Ok(found.id);
        }
    }
    if let Some(found) = Category::find_by_name(db, value).await? {
        return Ok(found.id);
    }
    Err(ApiError::NotFound(format!(
        "category not found for value '{value}'"
    )))
}

async fn resolve_sub_category_id(db: &PgPool, value: &str) -> Result<Uuid, ApiError> {
    if let Ok(id) = value.parse::<Uuid>() {
        if let Some(found) = SubCategory::find_by_id(db, id).await? {
            return Ok(found.id);
        }
    }
    if let Some(found) = SubCategory::find_by_name(db, value).await? {
        return Ok(found.id);
    }
    Err(ApiError::NotFound(format!(
        "subcategory not found for value '{value}'"
    )))
}

async fn resolve_ingredient_ids(db: &PgPool, values: &[String]) -> Result<Vec<String>, ApiError> {
    let mut ids = Vec::with_capacity(values.len());
    for value in values {
        ids.push(resolve_ingredient_id(db, value).await?);
    }
    Ok(ids)
}

fn meal_times_to_strings(times: &[MealTime]) -> Vec<String> {
    times.iter().map(|t| t.as_str().to_string()).collect()
}

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Paginated<Meal>>, ApiError> {
    let page = page.validated();

    let key = format!("meals:all:{}:{}", page.page, page.limit);
    if let Some(cached) = state.cache.get(&key).await {
        if let Ok(items) = serde_json::from_str::<Vec<Meal>>(&cached) {
            let total = Meal::count(&state.db).await?;
            return Ok(Json(Paginated::new(items, &page, total)));
        }
    }

    let total = Meal::count(&state.db).await?;
    let meals = Meal::list(&state.db, &page).await?;

    if let Ok(serialized) = serde_json::to_string(&meals) {
        state.cache.put(&key, &serialized, MEAL_LIST_CACHE_TTL).await;
    }
    Ok(Json(Paginated::new(meals, &page, total)))
}

#[instrument(skip(state))]
pub async fn get_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MealDetails>, ApiError> {
    let meal = Meal::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("meal"))?;

    let mut ingredients = Vec::with_capacity(meal.ingredient_ids.len());
    for ing_id in &meal.ingredient_ids {
        if let Some(ing) = Ingredient::find_by_id(&state.db, ing_id).await? {
            ingredients.push(ing);
        }
    }
    let category = Category::find_by_id(&state.db, meal.category_id).await?;
    let sub_category = SubCategory::find_by_id(&state.db, meal.sub_category_id).await?;

    Ok(Json(MealDetails {
        id: meal.id,
        name: meal.name,
        description: meal.description,
        ingredients,
        instructions: meal.instructions,
        image_url: meal.image_url,
        category,
        sub_category,
        diet_type: meal.diet_type,
        total_kcal: meal.total_kcal,
        tags: meal.tags,
        meal_times: meal.meal_times,
        rating: meal.rating,
    }))
}

#[instrument(skip(state, payload))]
pub async fn create_meal(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Json(payload): Json<CreateMealRequest>,
) -> Result<Json<Meal>, ApiError> {
    require_admin(&state, caller).await?;

    if payload.ingredients.is_empty() {
        return Err(ApiError::validation(
            "ingredients must be a non-empty list of ids or names",
        ));
    }
    if payload.total_kcal <= 0 {
        return Err(ApiError::validation("total_kcal must be positive"));
    }

    let ingredient_ids = resolve_ingredient_ids(&state.db, &payload.ingredients).await?;
    let category_id = resolve_category_id(&state.db, &payload.category).await?;
    let sub_category_id = resolve_sub_category_id(&state.db, &payload.sub_category).await?;

    let meal = Meal::create(
        &state.db,
        NewMeal {
            name: payload.name.trim(),
            description: &payload.description,
            ingredient_ids,
            instructions: payload.instructions,
            image_url: payload.image_url.as_deref(),
            category_id,
            sub_category_id,
            diet_type: payload.diet_type,
            total_kcal: payload.total_kcal,
            tags: payload.tags,
            meal_times: meal_times_to_strings(&payload.meal_times),
            rating: payload.rating,
        },
    )
    .await?;

    info!(meal_id = %meal.id, name = %meal.name, "meal created");
    Ok(Json(meal))
}

#[instrument(skip(state, payload))]
pub async fn update_meal(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMealRequest>,
) -> Result<Json<Meal>, ApiError> {
    require_admin(&state, caller).await?;

    if let Some(ings) = &payload.ingredients {
        if ings.is_empty() {
            return Err(ApiError::validation(
                "ingredients must be a non-empty list of ids or names",
            ));
        }
    }

    let ingredient_ids = match &payload.ingredients {
        Some(values) => Some(resolve_ingredient_ids(&state.db, values).await?),
        None => None,
    };
    let category_id = match &payload.category {
        Some(value) => Some(resolve_category_id(&state.db, value).await?),
        None => None,
    };
    let sub_category_id = match &payload.sub_category {
        Some(value) => Some(resolve_sub_category_id(&state.db, value).await?),
        None => None,
    };

    let meal = Meal::update(
        &state.db,
        id,
        MealUpdate {
            name: payload.name.as_deref(),
            description: payload.description.as_deref(),
            ingredient_ids,
            instructions: payload.instructions.clone(),
            image_url: payload.image_url.as_deref(),
            category_id,
            sub_category_id,
            diet_type: payload.diet_type,
            total_kcal: payload.total_kcal,
            tags: payload.tags.clone(),
            meal_times: payload.meal_times.as_deref().map(meal_times_to_strings),
            rating: payload.rating,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("meal"))?;

    info!(meal_id = %meal.id, "meal updated");
    Ok(Json(meal))
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Meal>, ApiError> {
    require_admin(&state, caller).await?;

    let meal = Meal::delete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("meal"))?;

    info!(meal_id = %meal.id, "meal deleted");
    Ok(Json(meal))
}

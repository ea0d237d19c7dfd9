use std::collections::HashSet;

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde_json::json;
use time::OffsetDateTime;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{repo::User, AuthUser},
    catalog::repo::Ingredient,
    error::ApiError,
    meals::{
        dto::MealSummary,
        repo::{Meal, MealTime},
    },
    notifications::{self, notifier::NotificationEvent, repo::NotificationKind},
    plans,
    recommend::{
        dto::{BodyHints, DetectFromUrlRequest, DetectResponse, PlanInput, PlanMeals, PlanRequest, PlanResult},
        matcher::match_ingredients,
        normalize::canonical_id,
        planner::{
            self, bucket_kcal_window, compute_energy_plan, ActivityLevel, Goal,
        },
        scorer::{diet_type_from_bmi, rank, should_relax_diet_filter, DEFAULT_RANK_LIMIT},
    },
    state::AppState,
    vision::ImageSource,
};

/// POST /recommend/ingredients — multipart upload, field `image` plus
/// optional `bmi` / `height_cm` / `weight_kg` text fields.
#[instrument(skip(state, mp))]
pub async fn detect_from_upload(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> Result<Json<DetectResponse>, ApiError> {
    let mut image: Option<ImageSource> = None;
    let mut hints = BodyHints::default();

    while let Ok(Some(field)) = mp.next_field().await {
        match field.name().map(str::to_string).as_deref() {
            Some("image") => {
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("unreadable image field: {e}")))?;
                image = Some(ImageSource::Bytes { data, mime_type });
            }
            Some("bmi") => hints.bmi = field.text().await.ok().and_then(|v| v.parse().ok()),
            Some("height_cm") => {
                hints.height_cm = field.text().await.ok().and_then(|v| v.parse().ok())
            }
            Some("weight_kg") => {
                hints.weight_kg = field.text().await.ok().and_then(|v| v.parse().ok())
            }
            _ => {}
        }
    }

    let image = image.ok_or_else(|| ApiError::validation("image field is required"))?;
    let response = detect_and_rank(&state, user_id, image, hints).await?;
    Ok(Json(response))
}

/// POST /recommend/ingredients/url — JSON body with a remote image URL.
#[instrument(skip(state, payload))]
pub async fn detect_from_url(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<DetectFromUrlRequest>,
) -> Result<Json<DetectResponse>, ApiError> {
    if payload.image_url.trim().is_empty() {
        return Err(ApiError::validation("image_url is required"));
    }
    let hints = BodyHints {
        bmi: payload.bmi,
        height_cm: payload.height_cm,
        weight_kg: payload.weight_kg,
    };
    let response = detect_and_rank(
        &state,
        user_id,
        ImageSource::Url(payload.image_url),
        hints,
    )
    .await?;
    Ok(Json(response))
}

/// Shared pipeline: vision → matcher → (premium diet filter) → scorer.
async fn detect_and_rank(
    state: &AppState,
    user_id: Uuid,
    image: ImageSource,
    hints: BodyHints,
) -> Result<DetectResponse, ApiError> {
    let detected = state
        .vision
        .detect_ingredients(image)
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    let catalog = Ingredient::list_all(&state.db).await?;
    let matched = match_ingredients(&detected, &catalog);

    // Valid outcome, not an error: hand the raw names back so the client can
    // correct them.
    if matched.is_empty() {
        return Ok(DetectResponse {
            detected,
            matched: Vec::new(),
            meals: Vec::new(),
            note: Some("no matching ingredients found in the catalog".into()),
        });
    }

    let matched_ids: HashSet<String> =
        matched.iter().map(|i| canonical_id(&i.id)).collect();

    let diet_filter = premium_diet_filter(state, user_id, &hints).await;

    let pool = Meal::matching_pool(&state.db, diet_filter).await?;
    let mut ranked = rank(pool, &matched_ids, DEFAULT_RANK_LIMIT);

    if diet_filter.is_some()
        && should_relax_diet_filter(ranked.is_empty(), !matched_ids.is_empty())
    {
        let pool = Meal::matching_pool(&state.db, None).await?;
        ranked = rank(pool, &matched_ids, DEFAULT_RANK_LIMIT);
    }

    Ok(DetectResponse {
        detected,
        matched,
        meals: ranked.iter().map(MealSummary::from).collect(),
        note: None,
    })
}

/// Premium users get their meal pool narrowed by BMI-derived diet type.
/// Entitlement or profile hiccups just skip the filter.
async fn premium_diet_filter(
    state: &AppState,
    user_id: Uuid,
    hints: &BodyHints,
) -> Option<crate::meals::repo::DietType> {
    let now = OffsetDateTime::now_utc();
    match state.entitlements.is_active(user_id, now).await {
        Ok(true) => {}
        Ok(false) => return None,
        Err(e) => {
            warn!(error = %e, user_id = %user_id, "entitlement check failed; skipping diet filter");
            return None;
        }
    }

    let bmi = match hints.bmi {
        Some(bmi) => Some(bmi),
        None => {
            let (height_cm, weight_kg) = match (hints.height_cm, hints.weight_kg) {
                (Some(h), Some(w)) => (Some(h), Some(w)),
                _ => match User::find_by_id(&state.db, user_id).await {
                    Ok(Some(user)) => (user.height_cm, user.weight_kg),
                    _ => (None, None),
                },
            };
            match (height_cm, weight_kg) {
                (Some(h), Some(w)) if h > 0.0 && w > 0.0 => {
                    let m = h / 100.0;
                    Some(w / (m * m))
                }
                _ => None,
            }
        }
    };

    bmi.and_then(diet_type_from_bmi)
}

/// POST /recommend/plan — BMI-driven meal plan. Premium feature.
#[instrument(skip(state, payload))]
pub async fn create_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<PlanRequest>,
) -> Result<Json<PlanResult>, ApiError> {
    // Input validation happens before any store access.
    let activity_level = payload
        .activity_level
        .parse::<ActivityLevel>()
        .map_err(ApiError::Validation)?;
    let goal = payload.goal.parse::<Goal>().map_err(ApiError::Validation)?;
    let height_cm = payload
        .height_cm
        .ok_or_else(|| ApiError::validation("height_cm is required"))?;
    let weight_kg = payload
        .weight_kg
        .ok_or_else(|| ApiError::validation("weight_kg is required"))?;
    if height_cm <= 0.0 {
        return Err(ApiError::validation("height_cm must be positive"));
    }
    if weight_kg <= 0.0 {
        return Err(ApiError::validation("weight_kg must be positive"));
    }

    let now = OffsetDateTime::now_utc();
    if !state
        .entitlements
        .is_active(user_id, now)
        .await
        .map_err(ApiError::Internal)?
    {
        return Err(ApiError::PaymentRequired(
            "premium feature: subscription expired or not activated".into(),
        ));
    }

    // Gender and birth date always come from the stored profile.
    let profile = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("account not found".into()))?;
    let age = planner::derive_age(
        profile.birth_date,
        now.date(),
        state.config.planner.fallback_age,
    );

    let energy = compute_energy_plan(
        height_cm,
        weight_kg,
        profile.gender,
        age,
        activity_level,
        goal,
    )?;

    // The three buckets are independent; query them concurrently.
    let (bf_min, bf_max) = bucket_kcal_window(energy.breakdown.breakfast);
    let (lu_min, lu_max) = bucket_kcal_window(energy.breakdown.lunch);
    let (di_min, di_max) = bucket_kcal_window(energy.breakdown.dinner);
    let (breakfast, lunch, dinner) = tokio::try_join!(
        Meal::for_bucket(
            &state.db,
            MealTime::Breakfast,
            energy.diet_type,
            bf_min,
            bf_max,
            planner::BUCKET_LIMIT,
        ),
        Meal::for_bucket(
            &state.db,
            MealTime::Lunch,
            energy.diet_type,
            lu_min,
            lu_max,
            planner::BUCKET_LIMIT,
        ),
        Meal::for_bucket(
            &state.db,
            MealTime::Dinner,
            energy.diet_type,
            di_min,
            di_max,
            planner::BUCKET_LIMIT,
        ),
    )
    .map_err(ApiError::Internal)?;

    let result = PlanResult {
        energy,
        meals: PlanMeals {
            breakfast: breakfast.iter().map(MealSummary::from).collect(),
            lunch: lunch.iter().map(MealSummary::from).collect(),
            dinner: dinner.iter().map(MealSummary::from).collect(),
        },
    };
    let input = PlanInput {
        height_cm,
        weight_kg,
        activity_level,
        goal,
    };

    // History is a best-effort side-write; its failure never fails the plan.
    if let Err(e) = plans::repo::insert(&state.db, user_id, &input, &result).await {
        warn!(error = %e, user_id = %user_id, "meal plan history write failed");
    }

    // Fire-and-forget notification.
    let event = NotificationEvent {
        kind: NotificationKind::MealPlanCreated,
        title: "Meal plan created".into(),
        message: format!(
            "Your personalised plan targets {} kcal/day",
            energy.calorie_target
        ),
        data: json!({
            "calorie_target": energy.calorie_target,
            "diet_type": energy.diet_type,
        }),
    };
    let notify_state = state.clone();
    tokio::spawn(async move {
        notifications::emit_best_effort(&notify_state, user_id, event).await;
    });

    Ok(Json(result))
}

use std::time::Duration;

use axum::{
    extract::{FromRef, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest,
            UpdateProfileRequest, UserListQuery,
        },
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
        repo::{NewUser, Role, User},
    },
    error::ApiError,
    pagination::{PageQuery, Paginated},
    state::AppState,
};

const PROFILE_CACHE_TTL: Duration = Duration::from_secs(300);
const USER_LIST_CACHE_TTL: Duration = Duration::from_secs(120);

const MIN_AGE_YEARS: i32 = 13;
const MAX_AGE_YEARS: i32 = 120;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/me", put(update_me))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/users", get(list_users))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn profile_cache_key(user_id: uuid::Uuid) -> String {
    format!("users:{user_id}")
}

/// Loads the caller and rejects non-admins.
pub(crate) async fn require_admin(state: &AppState, user_id: uuid::Uuid) -> Result<User, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("account not found".into()))?;
    if user.role != Role::Admin {
        return Err(ApiError::Forbidden("admin access required".into()));
    }
    Ok(user)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::validation("invalid email"));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::validation("password too short"));
    }
    let full_name = payload.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(ApiError::validation("full_name is required"));
    }

    let today = OffsetDateTime::now_utc().date();
    let age = User::age_on(payload.birth_date, today);
    if !(MIN_AGE_YEARS..=MAX_AGE_YEARS).contains(&age) {
        return Err(ApiError::validation(format!(
            "age must be between {MIN_AGE_YEARS} and {MAX_AGE_YEARS}"
        )));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("email already registered".into()));
    }
    if User::find_by_full_name(&state.db, &full_name).await?.is_some() {
        warn!(full_name = %full_name, "full name already taken");
        return Err(ApiError::Conflict("full name already taken".into()));
    }

    let hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        ApiError::Internal(e)
    })?;

    let user = User::create(
        &state.db,
        NewUser {
            email: &payload.email,
            password_hash: &hash,
            full_name: &full_name,
            gender: payload.gender,
            birth_date: payload.birth_date,
            occupation: payload.occupation,
            height_cm: payload.height_cm,
            weight_kg: payload.weight_kg,
        },
    )
    .await?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::validation("invalid email"));
    }

    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(ApiError::Unauthenticated("invalid credentials".into()));
        }
    };

    let ok = verify_password(&payload.password, &user.password_hash).map_err(|e| {
        error!(error = %e, "verify_password failed");
        ApiError::Internal(e)
    })?;
    if !ok {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthenticated("invalid credentials".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| ApiError::Unauthenticated(e.to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("user not found".into()))?;

    // Issue a new pair
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;

    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let key = profile_cache_key(user_id);
    if let Some(cached) = state.cache.get(&key).await {
        if let Ok(user) = serde_json::from_str::<PublicUser>(&cached) {
            return Ok(Json(user));
        }
    }

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("profile"))?;
    let public: PublicUser = user.into();

    if let Ok(serialized) = serde_json::to_string(&public) {
        state.cache.put(&key, &serialized, PROFILE_CACHE_TTL).await;
    }
    Ok(Json(public))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    if let Some(h) = payload.height_cm {
        if h <= 0.0 {
            return Err(ApiError::validation("height_cm must be positive"));
        }
    }
    if let Some(w) = payload.weight_kg {
        if w <= 0.0 {
            return Err(ApiError::validation("weight_kg must be positive"));
        }
    }

    let user = User::update_profile(
        &state.db,
        user_id,
        payload.full_name.as_deref(),
        payload.height_cm,
        payload.weight_kg,
    )
    .await?
    .ok_or_else(|| ApiError::not_found("profile"))?;

    state.cache.invalidate(&profile_cache_key(user_id)).await;
    info!(user_id = %user_id, "profile updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Query(page): Query<PageQuery>,
    Query(filter): Query<UserListQuery>,
) -> Result<Json<Paginated<PublicUser>>, ApiError> {
    require_admin(&state, caller).await?;

    let page = page.validated();
    let role = filter.role.unwrap_or(Role::Customer);
    let key = format!("users:all:role:{:?}:{}:{}", role, page.page, page.limit);
    if let Some(cached) = state.cache.get(&key).await {
        if let Ok(items) = serde_json::from_str::<Vec<PublicUser>>(&cached) {
            let total = User::count(&state.db, role).await?;
            return Ok(Json(Paginated::new(items, &page, total)));
        }
    }

    let total = User::count(&state.db, role).await?;
    let users = User::list(&state.db, &page, role).await?;
    let items: Vec<PublicUser> = users.into_iter().map(PublicUser::from).collect();

    if let Ok(serialized) = serde_json::to_string(&items) {
        state.cache.put(&key, &serialized, USER_LIST_CACHE_TTL).await;
    }
    Ok(Json(Paginated::new(items, &page, total)))
}

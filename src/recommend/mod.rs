use axum::{extract::DefaultBodyLimit, routing::post, Router};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod matcher;
pub mod normalize;
pub mod planner;
pub mod scorer;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/recommend/ingredients",
            post(handlers::detect_from_upload).layer(DefaultBodyLimit::max(10 * 1024 * 1024)),
        )
        .route("/recommend/ingredients/url", post(handlers::detect_from_url))
        .route("/recommend/plan", post(handlers::create_plan))
}

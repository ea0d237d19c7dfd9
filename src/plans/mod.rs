use crate::state::AppState;
use axum::{routing::get, Router};

pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plans", get(handlers::plan_history))
        .route("/plans/latest", get(handlers::latest_plan))
}

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

mod dto;
pub mod entitlement;
pub mod gateway;
pub mod handlers;
pub mod repo;

pub use entitlement::EntitlementSource;
pub use gateway::PaymentGateway;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payments", post(handlers::create_payment))
        .route("/payments/status", post(handlers::update_status))
        .route("/payments/me", get(handlers::my_transactions))
}

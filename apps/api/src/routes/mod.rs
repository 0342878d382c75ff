pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::workflow::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/leads", post(handlers::handle_submit_lead))
        .route("/api/v1/leads/:id", get(handlers::handle_get_lead))
        .route(
            "/api/v1/leads/:id/analyze",
            post(handlers::handle_analyze_lead),
        )
        .route(
            "/api/v1/conversation/next-question",
            post(handlers::handle_next_question),
        )
        .with_state(state)
}

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::handlers;
use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/problems", get(handlers::list_problems))
        .route("/problems/:id", get(handlers::get_problem))
        .route("/problems/:id/run", post(handlers::run_problem))
        .route("/problems/:id/submit", post(handlers::submit_problem))
        .route("/execute", post(handlers::execute))
        .route("/profile", get(handlers::get_profile))
        .route("/profile/name", put(handlers::set_display_name))
        .with_state(state)
}

use axum::Router;
use axum::middleware as axum_middleware;
use axum::routing::{get, post};

use crate::handlers;
use crate::middleware::{log_responses, request_context};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/posts", get(handlers::list_posts))
        .route("/render", post(handlers::render))
        .route("/categories", get(handlers::list_categories))
        .route("/post-types", get(handlers::list_post_types))
        .route("/cache/flush", post(handlers::flush_cache))
        .route("/events", post(handlers::content_event))
        .route("/health", get(handlers::health))
        .layer(axum_middleware::from_fn_with_state(state.clone(), request_context))
        .layer(axum_middleware::from_fn(log_responses))
        .with_state(state)
}

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with every Plumber endpoint.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/_healthcheck", get(handler::health_handler))
        .route("/:stage/push", post(handler::push_handler))
        .route("/:stage/pop", get(handler::pop_handler))
        .route("/:stage/flush", post(handler::flush_handler))
        .route("/:stage/stats", get(handler::stats_handler))
        .route("/:stage/store", post(handler::store_handler))
        .route("/:stage/load", get(handler::load_handler))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

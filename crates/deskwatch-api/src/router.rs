//! Route definitions for the controller HTTP surface.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the router with every route and middleware layer.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(worker_routes())
        .merge(ops_routes())
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Callbacks used by workers.
fn worker_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::worker::register))
        .route("/return_result", post(handlers::worker::return_result))
}

/// Liveness and introspection.
fn ops_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/status", get(handlers::status::status))
}

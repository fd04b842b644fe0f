//! Health check handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use deskwatch_core::traits::queue::MessageQueue;
use deskwatch_core::traits::table::TableStore;

use crate::dto::response::{BackendHealth, HealthResponse};
use crate::state::AppState;

/// GET /health
///
/// 200 when the store and the queue answer, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let store_healthy = state.store.health_check().await.unwrap_or(false);
    let queue_healthy = state.queue.health_check().await.unwrap_or(false);
    let healthy = store_healthy && queue_healthy;

    let body = HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        controller: state.controller.advertise_address().to_string(),
        store: BackendHealth {
            provider: state.store.provider_type().to_string(),
            healthy: store_healthy,
        },
        queue: BackendHealth {
            provider: state.queue.provider_type().to_string(),
            healthy: queue_healthy,
        },
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

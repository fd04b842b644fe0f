//! Worker callbacks.

use std::net::SocketAddr;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::http::header::HOST;

use deskwatch_core::error::AppError;
use deskwatch_core::types::{JobId, WorkerId};

use crate::dto::request::{RegisterParams, ReturnResultParams};
use crate::error::ApiError;
use crate::extractors::RemoteAddr;
use crate::state::AppState;

/// POST /register
///
/// Answers `OK,<host>` where `<host>` is the host the worker reached us on.
pub async fn register(
    State(state): State<AppState>,
    RemoteAddr(peer): RemoteAddr,
    headers: HeaderMap,
    Query(params): Query<RegisterParams>,
) -> Result<String, ApiError> {
    let worker_id: WorkerId = params.worker_id.parse().map_err(|_| {
        AppError::validation(format!("Invalid worker id '{}'", params.worker_id))
    })?;

    let address = match params.address.as_deref().map(str::trim) {
        Some(address) if !address.is_empty() => address.to_string(),
        _ => SocketAddr::new(peer.ip(), state.config.controller.worker_port).to_string(),
    };

    state.controller.register_worker(worker_id, &address).await?;

    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| state.controller.advertise_address().to_string());
    Ok(format!("OK,{host}"))
}

/// POST /return_result
pub async fn return_result(
    State(state): State<AppState>,
    Query(params): Query<ReturnResultParams>,
) -> Result<&'static str, ApiError> {
    let job_id: JobId = params
        .job_id
        .parse()
        .map_err(|_| AppError::validation(format!("Invalid job id '{}'", params.job_id)))?;

    state.controller.complete(job_id, &params.result).await?;
    Ok("OK")
}

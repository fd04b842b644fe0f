//! Controller status handler.

use axum::Json;
use axum::extract::State;

use deskwatch_controller::ControllerStatus;

use crate::state::AppState;

/// GET /status
pub async fn status(State(state): State<AppState>) -> Json<ControllerStatus> {
    Json(state.controller.status().await)
}

//! State shared by every handler.

use std::sync::Arc;
use std::time::Instant;

use deskwatch_controller::Controller;
use deskwatch_core::config::AppConfig;
use deskwatch_store::{QueueManager, StoreManager};

/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub controller: Arc<Controller>,
    /// Probed by `/health`.
    pub store: StoreManager,
    /// Probed by `/health`.
    pub queue: QueueManager,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        controller: Arc<Controller>,
        store: StoreManager,
        queue: QueueManager,
    ) -> Self {
        Self {
            config,
            controller,
            store,
            queue,
            started_at: Instant::now(),
        }
    }
}

//! Point-in-time view of the controller for `/status`.

use serde::Serialize;

use deskwatch_entity::worker::WorkerRecord;

use crate::controller::Controller;
use crate::registry::WorkerSnapshot;
use crate::restart::RestartSnapshot;

#[derive(Debug, Clone, Serialize)]
pub struct ControllerStatus {
    pub controller: String,
    pub workers: Vec<WorkerSnapshot>,
    pub synced_workers: Vec<WorkerRecord>,
    pub pending_restarts: Vec<RestartSnapshot>,
}

impl Controller {
    pub async fn status(&self) -> ControllerStatus {
        let workers = self.registry().lock().await.snapshots();
        let synced_workers = self.synced().lock().await.records();
        let pending_restarts = self.restarts().lock().await.snapshots();
        ControllerStatus {
            controller: self.advertise_address().to_string(),
            workers,
            synced_workers,
            pending_restarts,
        }
    }
}

//! Registered worker repository.

use deskwatch_core::result::AppResult;
use deskwatch_core::types::timestamp::Timestamp;
use deskwatch_core::types::WorkerId;
use deskwatch_entity::partition::REGISTERED_WORKERS;
use deskwatch_entity::worker::WorkerRecord;

use super::table::PartitionTable;
use crate::provider::StoreManager;

/// Rows of the `RegisteredWorkers` partition.
#[derive(Debug, Clone)]
pub struct WorkerRepository {
    table: PartitionTable<WorkerRecord>,
}

impl WorkerRepository {
    pub fn new(store: StoreManager) -> Self {
        Self {
            table: PartitionTable::new(store, REGISTERED_WORKERS),
        }
    }

    /// Write a worker row, replacing any previous registration.
    pub async fn save(&self, worker: &WorkerRecord) -> AppResult<()> {
        self.table.upsert(&worker.worker_id.to_string(), worker).await
    }

    pub async fn find(&self, id: WorkerId) -> AppResult<Option<WorkerRecord>> {
        self.table.get(&id.to_string()).await
    }

    /// Refresh the stored heartbeat. Returns `false` if the row is gone.
    pub async fn touch_heartbeat(&self, id: WorkerId, at: Timestamp) -> AppResult<bool> {
        let Some(mut worker) = self.find(id).await? else {
            return Ok(false);
        };
        worker.last_heartbeat = at;
        self.save(&worker).await?;
        Ok(true)
    }

    pub async fn delete(&self, id: WorkerId) -> AppResult<bool> {
        self.table.delete(&id.to_string()).await
    }

    pub async fn list(&self) -> AppResult<Vec<WorkerRecord>> {
        self.table.list().await
    }
}

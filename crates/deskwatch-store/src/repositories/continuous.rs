//! Continuous run request repository.

use deskwatch_core::result::AppResult;
use deskwatch_entity::continuous::ContinuousRunRequest;
use deskwatch_entity::partition::CONTINUOUS_RUN;

use super::table::PartitionTable;
use crate::provider::StoreManager;

/// Rows of the `ContinuousRun` partition.
#[derive(Debug, Clone)]
pub struct ContinuousRunRepository {
    table: PartitionTable<ContinuousRunRequest>,
}

impl ContinuousRunRepository {
    pub fn new(store: StoreManager) -> Self {
        Self {
            table: PartitionTable::new(store, CONTINUOUS_RUN),
        }
    }

    /// Store a new request.
    pub async fn create(&self, request: &ContinuousRunRequest) -> AppResult<()> {
        self.table.insert(&request.run_id, request).await
    }

    /// Persist changes to a request (cooldown stamp, error count).
    pub async fn save(&self, request: &ContinuousRunRequest) -> AppResult<()> {
        self.table.upsert(&request.run_id, request).await
    }

    pub async fn find(&self, run_id: &str) -> AppResult<Option<ContinuousRunRequest>> {
        self.table.get(run_id).await
    }

    pub async fn delete(&self, run_id: &str) -> AppResult<bool> {
        self.table.delete(run_id).await
    }

    pub async fn list(&self) -> AppResult<Vec<ContinuousRunRequest>> {
        self.table.list().await
    }
}

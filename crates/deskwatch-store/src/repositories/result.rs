//! Result repository.

use deskwatch_core::result::AppResult;
use deskwatch_entity::partition::RESULT;
use deskwatch_entity::result::ResultRecord;

use super::table::PartitionTable;
use crate::provider::StoreManager;

/// Rows of the `Result` partition, keyed by request id.
#[derive(Debug, Clone)]
pub struct ResultRepository {
    table: PartitionTable<ResultRecord>,
}

impl ResultRepository {
    pub fn new(store: StoreManager) -> Self {
        Self {
            table: PartitionTable::new(store, RESULT),
        }
    }

    /// Store a result. A duplicate delivery overwrites the earlier copy.
    pub async fn save(&self, result: &ResultRecord) -> AppResult<()> {
        self.table.upsert(&result.run_id, result).await
    }

    pub async fn find(&self, run_id: &str) -> AppResult<Option<ResultRecord>> {
        self.table.get(run_id).await
    }

    pub async fn delete(&self, run_id: &str) -> AppResult<bool> {
        self.table.delete(run_id).await
    }

    pub async fn list(&self) -> AppResult<Vec<ResultRecord>> {
        self.table.list().await
    }
}

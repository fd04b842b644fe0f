//! Desks cache repository.

use deskwatch_core::result::AppResult;
use deskwatch_entity::desks::DesksCache;
use deskwatch_entity::partition::{DESKS, DESKS_ROW};

use super::table::PartitionTable;
use crate::provider::StoreManager;

/// The singleton row of the `Desks` partition.
#[derive(Debug, Clone)]
pub struct DesksRepository {
    table: PartitionTable<DesksCache>,
}

impl DesksRepository {
    pub fn new(store: StoreManager) -> Self {
        Self {
            table: PartitionTable::new(store, DESKS),
        }
    }

    pub async fn get(&self) -> AppResult<Option<DesksCache>> {
        self.table.get(DESKS_ROW).await
    }

    /// Replace the cached desk list.
    pub async fn save(&self, desks: &DesksCache) -> AppResult<()> {
        self.table.upsert(DESKS_ROW, desks).await
    }

    pub async fn delete(&self) -> AppResult<bool> {
        self.table.delete(DESKS_ROW).await
    }
}

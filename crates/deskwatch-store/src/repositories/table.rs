//! Typed access to one partition.

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use deskwatch_core::result::AppResult;
use deskwatch_core::traits::table::{TableEntity, TableStore};

use crate::provider::StoreManager;

/// A partition whose rows all decode to `T`.
#[derive(Debug, Clone)]
pub(crate) struct PartitionTable<T> {
    store: StoreManager,
    partition: &'static str,
    _record: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> PartitionTable<T> {
    pub(crate) fn new(store: StoreManager, partition: &'static str) -> Self {
        Self {
            store,
            partition,
            _record: PhantomData,
        }
    }

    pub(crate) async fn insert(&self, row_key: &str, record: &T) -> AppResult<()> {
        let entity = TableEntity::from_record(self.partition, row_key, record)?;
        self.store.insert(&entity).await
    }

    pub(crate) async fn upsert(&self, row_key: &str, record: &T) -> AppResult<()> {
        let entity = TableEntity::from_record(self.partition, row_key, record)?;
        self.store.upsert(&entity).await
    }

    pub(crate) async fn get(&self, row_key: &str) -> AppResult<Option<T>> {
        match self.store.get(self.partition, row_key).await? {
            Some(entity) => entity.to_record().map(Some),
            None => Ok(None),
        }
    }

    pub(crate) async fn delete(&self, row_key: &str) -> AppResult<bool> {
        self.store.delete(self.partition, row_key).await
    }

    /// All decodable rows. Rows that fail to decode are logged and skipped.
    pub(crate) async fn list(&self) -> AppResult<Vec<T>> {
        let entities = self.store.query(self.partition).await?;
        Ok(entities
            .into_iter()
            .filter_map(|entity| match entity.to_record() {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(
                        partition = self.partition,
                        row_key = %entity.row_key,
                        error = %e,
                        "Skipping undecodable row"
                    );
                    None
                }
            })
            .collect())
    }
}

//! In-memory table store using `dashmap`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};

use deskwatch_core::error::AppError;
use deskwatch_core::result::AppResult;
use deskwatch_core::traits::table::{TableEntity, TableStore};

type Partition = BTreeMap<String, Map<String, Value>>;

/// Table store kept in process memory. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryTableStore {
    partitions: Arc<DashMap<String, Partition>>,
}

impl MemoryTableStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn insert(&self, entity: &TableEntity) -> AppResult<()> {
        let mut partition = self
            .partitions
            .entry(entity.partition_key.clone())
            .or_default();
        if partition.contains_key(&entity.row_key) {
            return Err(AppError::conflict(format!(
                "Entity {}/{} already exists",
                entity.partition_key, entity.row_key
            )));
        }
        partition.insert(entity.row_key.clone(), entity.properties.clone());
        Ok(())
    }

    async fn upsert(&self, entity: &TableEntity) -> AppResult<()> {
        self.partitions
            .entry(entity.partition_key.clone())
            .or_default()
            .insert(entity.row_key.clone(), entity.properties.clone());
        Ok(())
    }

    async fn get(&self, partition_key: &str, row_key: &str) -> AppResult<Option<TableEntity>> {
        Ok(self.partitions.get(partition_key).and_then(|partition| {
            partition.get(row_key).map(|properties| TableEntity {
                partition_key: partition_key.to_string(),
                row_key: row_key.to_string(),
                properties: properties.clone(),
            })
        }))
    }

    async fn delete(&self, partition_key: &str, row_key: &str) -> AppResult<bool> {
        Ok(self
            .partitions
            .get_mut(partition_key)
            .and_then(|mut partition| partition.remove(row_key))
            .is_some())
    }

    async fn query(&self, partition_key: &str) -> AppResult<Vec<TableEntity>> {
        Ok(self
            .partitions
            .get(partition_key)
            .map(|partition| {
                partition
                    .iter()
                    .map(|(row_key, properties)| TableEntity {
                        partition_key: partition_key.to_string(),
                        row_key: row_key.clone(),
                        properties: properties.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskwatch_core::error::ErrorKind;

    fn entity(row: &str, value: i64) -> TableEntity {
        let mut properties = Map::new();
        properties.insert("value".into(), Value::from(value));
        TableEntity {
            partition_key: "P".into(),
            row_key: row.into(),
            properties,
        }
    }

    #[tokio::test]
    async fn test_insert_conflicts_on_existing_row() {
        let store = MemoryTableStore::new();
        store.insert(&entity("a", 1)).await.unwrap();
        let err = store.insert(&entity("a", 2)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        store.upsert(&entity("a", 3)).await.unwrap();
        let row = store.get("P", "a").await.unwrap().unwrap();
        assert_eq!(row.properties["value"], 3);
    }

    #[tokio::test]
    async fn test_missing_row_is_none() {
        let store = MemoryTableStore::new();
        assert!(store.get("P", "nope").await.unwrap().is_none());
        assert!(!store.delete("P", "nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_query_is_ordered_by_row_key() {
        let store = MemoryTableStore::new();
        store.upsert(&entity("b", 2)).await.unwrap();
        store.upsert(&entity("a", 1)).await.unwrap();
        let rows = store.query("P").await.unwrap();
        let keys: Vec<_> = rows.iter().map(|r| r.row_key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(store.query("Other").await.unwrap().is_empty());
    }
}

//! Partitioned table store trait.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::result::AppResult;

/// One row of the table store: a partition key, a row key and a bag of
/// named properties.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct TableEntity {
    /// Partition the row belongs to.
    pub partition_key: String,
    /// Key of the row within its partition.
    pub row_key: String,
    /// Row properties.
    pub properties: Map<String, Value>,
}

impl TableEntity {
    /// Build an entity from any record that serializes to a JSON object.
    pub fn from_record<T: Serialize>(
        partition_key: impl Into<String>,
        row_key: impl Into<String>,
        record: &T,
    ) -> AppResult<Self> {
        match serde_json::to_value(record)? {
            Value::Object(properties) => Ok(Self {
                partition_key: partition_key.into(),
                row_key: row_key.into(),
                properties,
            }),
            other => Err(AppError::internal(format!(
                "Entity record must serialize to an object, got {other}"
            ))),
        }
    }

    /// Deserialize the properties into a typed record.
    pub fn to_record<T: DeserializeOwned>(&self) -> AppResult<T> {
        Ok(serde_json::from_value(Value::Object(self.properties.clone()))?)
    }
}

/// Trait for table store backends (in-memory, PostgreSQL, Redis).
///
/// Reads of a missing row return `Ok(None)`; only transport or encoding
/// failures are errors.
#[async_trait]
pub trait TableStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g. `"memory"`, `"postgres"`).
    fn provider_type(&self) -> &str;

    /// Create a row. Fails with `Conflict` if the key is already taken.
    async fn insert(&self, entity: &TableEntity) -> AppResult<()>;

    /// Create or replace a row.
    async fn upsert(&self, entity: &TableEntity) -> AppResult<()>;

    /// Fetch a row by key.
    async fn get(&self, partition_key: &str, row_key: &str) -> AppResult<Option<TableEntity>>;

    /// Delete a row. Returns `true` when a row was removed.
    async fn delete(&self, partition_key: &str, row_key: &str) -> AppResult<bool>;

    /// All rows of a partition, ordered by row key.
    async fn query(&self, partition_key: &str) -> AppResult<Vec<TableEntity>>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}

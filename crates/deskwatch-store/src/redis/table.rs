//! Redis table store: one hash per partition, row key to JSON properties.

use async_trait::async_trait;
use redis::AsyncCommands;
use serde_json::{Map, Value};

use deskwatch_core::error::{AppError, ErrorKind};
use deskwatch_core::result::AppResult;
use deskwatch_core::traits::table::{TableEntity, TableStore};

use super::client::RedisClient;

/// Redis-backed table store.
#[derive(Debug, Clone)]
pub struct RedisTableStore {
    client: RedisClient,
}

impl RedisTableStore {
    /// Create a store on an existing client.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    fn partition_key(&self, partition: &str) -> String {
        self.client.prefixed_key(&format!("table:{partition}"))
    }

    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Store, format!("Redis error: {e}"), e)
    }

    fn decode(partition_key: &str, row_key: String, raw: &str) -> AppResult<TableEntity> {
        let properties: Map<String, Value> = serde_json::from_str(raw)?;
        Ok(TableEntity {
            partition_key: partition_key.to_string(),
            row_key,
            properties,
        })
    }
}

#[async_trait]
impl TableStore for RedisTableStore {
    fn provider_type(&self) -> &str {
        "redis"
    }

    async fn insert(&self, entity: &TableEntity) -> AppResult<()> {
        let key = self.partition_key(&entity.partition_key);
        let value = serde_json::to_string(&entity.properties)?;
        let mut conn = self.client.conn_mut();
        let created: bool = conn
            .hset_nx(&key, &entity.row_key, value)
            .await
            .map_err(Self::map_err)?;
        if !created {
            return Err(AppError::conflict(format!(
                "Entity {}/{} already exists",
                entity.partition_key, entity.row_key
            )));
        }
        Ok(())
    }

    async fn upsert(&self, entity: &TableEntity) -> AppResult<()> {
        let key = self.partition_key(&entity.partition_key);
        let value = serde_json::to_string(&entity.properties)?;
        let mut conn = self.client.conn_mut();
        let _: () = conn
            .hset(&key, &entity.row_key, value)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn get(&self, partition_key: &str, row_key: &str) -> AppResult<Option<TableEntity>> {
        let key = self.partition_key(partition_key);
        let mut conn = self.client.conn_mut();
        let raw: Option<String> = conn.hget(&key, row_key).await.map_err(Self::map_err)?;
        raw.map(|raw| Self::decode(partition_key, row_key.to_string(), &raw))
            .transpose()
    }

    async fn delete(&self, partition_key: &str, row_key: &str) -> AppResult<bool> {
        let key = self.partition_key(partition_key);
        let mut conn = self.client.conn_mut();
        let removed: u64 = conn.hdel(&key, row_key).await.map_err(Self::map_err)?;
        Ok(removed > 0)
    }

    async fn query(&self, partition_key: &str) -> AppResult<Vec<TableEntity>> {
        let key = self.partition_key(partition_key);
        let mut conn = self.client.conn_mut();
        let mut rows: Vec<(String, String)> = conn.hgetall(&key).await.map_err(Self::map_err)?;
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows.into_iter()
            .map(|(row_key, raw)| Self::decode(partition_key, row_key, &raw))
            .collect()
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.client.ping().await
    }
}

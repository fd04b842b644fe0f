//! Backend selection.
//!
//! [`StoreManager`] and [`QueueManager`] wrap the configured providers;
//! [`Backends::connect`] builds both and shares one connection pool when
//! the store and the queue use the same backend.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use deskwatch_core::config::{QueueConfig, StoreConfig};
use deskwatch_core::error::AppError;
use deskwatch_core::result::AppResult;
use deskwatch_core::traits::queue::{MessageQueue, QueueMessage};
use deskwatch_core::traits::table::{TableEntity, TableStore};

/// Table store wrapping the configured provider.
#[derive(Debug, Clone)]
pub struct StoreManager {
    inner: Arc<dyn TableStore>,
}

impl StoreManager {
    /// Wrap an existing provider.
    pub fn from_provider(provider: Arc<dyn TableStore>) -> Self {
        Self { inner: provider }
    }
}

#[async_trait]
impl TableStore for StoreManager {
    fn provider_type(&self) -> &str {
        self.inner.provider_type()
    }

    async fn insert(&self, entity: &TableEntity) -> AppResult<()> {
        self.inner.insert(entity).await
    }

    async fn upsert(&self, entity: &TableEntity) -> AppResult<()> {
        self.inner.upsert(entity).await
    }

    async fn get(&self, partition_key: &str, row_key: &str) -> AppResult<Option<TableEntity>> {
        self.inner.get(partition_key, row_key).await
    }

    async fn delete(&self, partition_key: &str, row_key: &str) -> AppResult<bool> {
        self.inner.delete(partition_key, row_key).await
    }

    async fn query(&self, partition_key: &str) -> AppResult<Vec<TableEntity>> {
        self.inner.query(partition_key).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}

/// Message queue wrapping the configured provider.
#[derive(Debug, Clone)]
pub struct QueueManager {
    inner: Arc<dyn MessageQueue>,
}

impl QueueManager {
    /// Wrap an existing provider.
    pub fn from_provider(provider: Arc<dyn MessageQueue>) -> Self {
        Self { inner: provider }
    }
}

#[async_trait]
impl MessageQueue for QueueManager {
    fn provider_type(&self) -> &str {
        self.inner.provider_type()
    }

    async fn send(&self, content: &str) -> AppResult<()> {
        self.inner.send(content).await
    }

    async fn receive(&self) -> AppResult<Option<QueueMessage>> {
        self.inner.receive().await
    }

    async fn delete(&self, message: &QueueMessage) -> AppResult<()> {
        self.inner.delete(message).await
    }

    async fn len(&self) -> AppResult<usize> {
        self.inner.len().await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}

/// The connected store and queue.
#[derive(Debug, Clone)]
pub struct Backends {
    pub store: StoreManager,
    pub queue: QueueManager,
    #[cfg(feature = "postgres")]
    database: Option<crate::postgres::DatabasePool>,
}

impl Backends {
    /// Connect the configured store and queue providers.
    pub async fn connect(store: &StoreConfig, queue: &QueueConfig) -> AppResult<Self> {
        let uses = |name: &str| store.provider == name || queue.provider == name;
        let visibility = std::time::Duration::from_secs(queue.visibility_timeout_seconds);

        #[cfg(feature = "postgres")]
        let database = if uses("postgres") {
            let pool = crate::postgres::DatabasePool::connect(&store.postgres).await?;
            if store.postgres.run_migrations {
                crate::postgres::run_migrations(pool.pool()).await?;
            }
            Some(pool)
        } else {
            None
        };

        #[cfg(feature = "redis-backend")]
        let redis = if uses("redis") {
            Some(crate::redis::RedisClient::connect(&store.redis).await?)
        } else {
            None
        };

        #[cfg(feature = "memory")]
        let memory_store = crate::memory::MemoryTableStore::new();

        let table: Arc<dyn TableStore> = match store.provider.as_str() {
            #[cfg(feature = "memory")]
            "memory" => Arc::new(memory_store),
            #[cfg(feature = "postgres")]
            "postgres" => match &database {
                Some(pool) => Arc::new(crate::postgres::PgTableStore::new(pool.pool().clone())),
                None => return Err(AppError::internal("PostgreSQL pool was not created")),
            },
            #[cfg(feature = "redis-backend")]
            "redis" => match &redis {
                Some(client) => Arc::new(crate::redis::RedisTableStore::new(client.clone())),
                None => return Err(AppError::internal("Redis client was not created")),
            },
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown store provider: '{other}'. Supported: memory, postgres, redis"
                )));
            }
        };

        let message_queue: Arc<dyn MessageQueue> = match queue.provider.as_str() {
            #[cfg(feature = "memory")]
            "memory" => Arc::new(crate::memory::MemoryQueue::new(visibility)),
            #[cfg(feature = "postgres")]
            "postgres" => match &database {
                Some(pool) => Arc::new(crate::postgres::PgQueue::new(
                    pool.pool().clone(),
                    queue.name.clone(),
                    visibility,
                )),
                None => return Err(AppError::internal("PostgreSQL pool was not created")),
            },
            #[cfg(feature = "redis-backend")]
            "redis" => match &redis {
                Some(client) => Arc::new(crate::redis::RedisQueue::new(
                    client.clone(),
                    queue.name.clone(),
                    visibility,
                )),
                None => return Err(AppError::internal("Redis client was not created")),
            },
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown queue provider: '{other}'. Supported: memory, postgres, redis"
                )));
            }
        };

        info!(
            store = %store.provider,
            queue = %queue.provider,
            queue_name = %queue.name,
            "Store and queue backends ready"
        );

        Ok(Self {
            store: StoreManager::from_provider(table),
            queue: QueueManager::from_provider(message_queue),
            #[cfg(feature = "postgres")]
            database,
        })
    }

    /// In-memory store and queue.
    #[cfg(feature = "memory")]
    pub fn in_memory(visibility_timeout: std::time::Duration) -> Self {
        Self {
            store: StoreManager::from_provider(Arc::new(crate::memory::MemoryTableStore::new())),
            queue: QueueManager::from_provider(Arc::new(crate::memory::MemoryQueue::new(
                visibility_timeout,
            ))),
            #[cfg(feature = "postgres")]
            database: None,
        }
    }

    /// Release pooled connections.
    pub async fn close(&self) {
        #[cfg(feature = "postgres")]
        if let Some(pool) = &self.database {
            pool.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backends_from_config() {
        let backends = Backends::connect(&StoreConfig::default(), &QueueConfig::default())
            .await
            .unwrap();
        assert_eq!(backends.store.provider_type(), "memory");
        assert_eq!(backends.queue.provider_type(), "memory");
        assert!(backends.store.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_provider_rejected() {
        let store = StoreConfig {
            provider: "azure".into(),
            ..StoreConfig::default()
        };
        let err = Backends::connect(&store, &QueueConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, deskwatch_core::error::ErrorKind::Configuration);
    }
}

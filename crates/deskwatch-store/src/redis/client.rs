//! Redis connection management.

use redis::Client;
use redis::aio::ConnectionManager;
use tracing::info;

use deskwatch_core::config::RedisConfig;
use deskwatch_core::error::{AppError, ErrorKind};
use deskwatch_core::result::AppResult;

use crate::url::mask_password;

/// Redis client wrapper with connection management.
#[derive(Debug, Clone)]
pub struct RedisClient {
    /// Reconnecting connection manager.
    conn: ConnectionManager,
    /// Key prefix for all keys.
    key_prefix: String,
}

impl RedisClient {
    /// Connect using the store's Redis settings.
    pub async fn connect(config: &RedisConfig) -> AppResult<Self> {
        info!(url = %mask_password(&config.url), "Connecting to Redis");

        let client = Client::open(config.url.as_str()).map_err(|e| {
            AppError::with_source(ErrorKind::Store, "Failed to create Redis client", e)
        })?;

        let conn = ConnectionManager::new(client).await.map_err(|e| {
            AppError::with_source(ErrorKind::Store, "Failed to connect to Redis", e)
        })?;

        info!("Connected to Redis");
        Ok(Self {
            conn,
            key_prefix: config.key_prefix.clone(),
        })
    }

    /// Get a mutable clone of the connection manager.
    pub fn conn_mut(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// Build a full key with the configured prefix.
    pub fn prefixed_key(&self, key: &str) -> String {
        format!("{}{key}", self.key_prefix)
    }

    /// Round-trip a PING.
    pub async fn ping(&self) -> AppResult<bool> {
        let mut conn = self.conn_mut();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Store, "Redis PING failed", e))?;
        Ok(pong.eq_ignore_ascii_case("pong"))
    }
}

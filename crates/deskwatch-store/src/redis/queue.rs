//! Redis message queue.
//!
//! Layout under `{prefix}queue:{name}`:
//! - `:ready` list of visible message ids, oldest at the head
//! - `:inflight` sorted set of received ids scored by their visibility deadline
//! - `:messages` hash of id to `{content, dequeue_count, receipt}`
//!
//! Receive and delete run as Lua scripts so a message is never handed to
//! two receivers inside one visibility window.

use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Script};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use deskwatch_core::error::{AppError, ErrorKind};
use deskwatch_core::result::AppResult;
use deskwatch_core::traits::queue::{MessageQueue, QueueMessage};

use super::client::RedisClient;

const RECEIVE_SCRIPT: &str = r#"
local expired = redis.call('ZRANGEBYSCORE', KEYS[2], '-inf', ARGV[1])
for i = #expired, 1, -1 do
    redis.call('ZREM', KEYS[2], expired[i])
    redis.call('LPUSH', KEYS[1], expired[i])
end
while true do
    local id = redis.call('LPOP', KEYS[1])
    if not id then
        return false
    end
    local raw = redis.call('HGET', KEYS[3], id)
    if raw then
        local msg = cjson.decode(raw)
        msg.dequeue_count = msg.dequeue_count + 1
        msg.receipt = ARGV[3]
        redis.call('HSET', KEYS[3], id, cjson.encode(msg))
        redis.call('ZADD', KEYS[2], ARGV[2], id)
        return {id, msg.content, msg.dequeue_count}
    end
end
"#;

const DELETE_SCRIPT: &str = r#"
local raw = redis.call('HGET', KEYS[2], ARGV[1])
if not raw then
    return 0
end
local msg = cjson.decode(raw)
if msg.receipt ~= ARGV[2] then
    return 0
end
redis.call('ZREM', KEYS[1], ARGV[1])
redis.call('HDEL', KEYS[2], ARGV[1])
return 1
"#;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    content: String,
    dequeue_count: u32,
    receipt: String,
}

/// Redis-backed message queue.
#[derive(Debug, Clone)]
pub struct RedisQueue {
    client: RedisClient,
    name: String,
    visibility_timeout: Duration,
}

impl RedisQueue {
    /// Create a queue on an existing client.
    pub fn new(client: RedisClient, name: impl Into<String>, visibility_timeout: Duration) -> Self {
        Self {
            client,
            name: name.into(),
            visibility_timeout,
        }
    }

    fn key(&self, suffix: &str) -> String {
        self.client
            .prefixed_key(&format!("queue:{}:{suffix}", self.name))
    }

    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Queue, format!("Redis error: {e}"), e)
    }
}

#[async_trait]
impl MessageQueue for RedisQueue {
    fn provider_type(&self) -> &str {
        "redis"
    }

    async fn send(&self, content: &str) -> AppResult<()> {
        let id = Uuid::new_v4().to_string();
        let envelope = serde_json::to_string(&Envelope {
            content: content.to_string(),
            dequeue_count: 0,
            receipt: String::new(),
        })?;
        let mut conn = self.client.conn_mut();
        let _: () = redis::pipe()
            .atomic()
            .hset(self.key("messages"), &id, envelope)
            .ignore()
            .rpush(self.key("ready"), &id)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn receive(&self) -> AppResult<Option<QueueMessage>> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let deadline_ms = now_ms + self.visibility_timeout.as_millis() as i64;
        let receipt = Uuid::new_v4().to_string();

        let mut conn = self.client.conn_mut();
        let delivered: Option<(String, String, u32)> = Script::new(RECEIVE_SCRIPT)
            .key(self.key("ready"))
            .key(self.key("inflight"))
            .key(self.key("messages"))
            .arg(now_ms)
            .arg(deadline_ms)
            .arg(&receipt)
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        Ok(delivered.map(|(id, content, dequeue_count)| QueueMessage {
            id,
            pop_receipt: receipt,
            content,
            dequeue_count,
        }))
    }

    async fn delete(&self, message: &QueueMessage) -> AppResult<()> {
        let mut conn = self.client.conn_mut();
        let removed: i64 = Script::new(DELETE_SCRIPT)
            .key(self.key("inflight"))
            .key(self.key("messages"))
            .arg(&message.id)
            .arg(&message.pop_receipt)
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        if removed == 0 {
            return Err(AppError::not_found(format!(
                "Message {} not found or receipt expired",
                message.id
            )));
        }
        Ok(())
    }

    async fn len(&self) -> AppResult<usize> {
        let mut conn = self.client.conn_mut();
        let count: usize = conn.hlen(self.key("messages")).await.map_err(Self::map_err)?;
        Ok(count)
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.client.ping().await
    }
}

//! PostgreSQL message queue.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use deskwatch_core::error::{AppError, ErrorKind};
use deskwatch_core::result::AppResult;
use deskwatch_core::traits::queue::{MessageQueue, QueueMessage};

/// Queue over the `queue_messages` table.
#[derive(Debug, Clone)]
pub struct PgQueue {
    pool: PgPool,
    name: String,
    visibility_timeout: Duration,
}

impl PgQueue {
    /// Create a queue on an existing pool.
    pub fn new(pool: PgPool, name: impl Into<String>, visibility_timeout: Duration) -> Self {
        Self {
            pool,
            name: name.into(),
            visibility_timeout,
        }
    }

    fn map_err(context: &str, e: sqlx::Error) -> AppError {
        AppError::with_source(ErrorKind::Queue, format!("{context}: {e}"), e)
    }
}

#[async_trait]
impl MessageQueue for PgQueue {
    fn provider_type(&self) -> &str {
        "postgres"
    }

    async fn send(&self, content: &str) -> AppResult<()> {
        sqlx::query("INSERT INTO queue_messages (id, queue_name, content) VALUES ($1, $2, $3)")
            .bind(Uuid::new_v4())
            .bind(&self.name)
            .bind(content)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_err("Failed to send message", e))?;
        Ok(())
    }

    async fn receive(&self) -> AppResult<Option<QueueMessage>> {
        let receipt = Uuid::new_v4();
        let row = sqlx::query_as::<_, (Uuid, String, i32)>(
            "UPDATE queue_messages \
             SET visible_at = NOW() + make_interval(secs => $2), \
                 dequeue_count = dequeue_count + 1, \
                 pop_receipt = $3 \
             WHERE id = ( \
                 SELECT id FROM queue_messages \
                 WHERE queue_name = $1 AND visible_at <= NOW() \
                 ORDER BY created_at \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING id, content, dequeue_count",
        )
        .bind(&self.name)
        .bind(self.visibility_timeout.as_secs_f64())
        .bind(receipt)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::map_err("Failed to receive message", e))?;

        Ok(row.map(|(id, content, dequeue_count)| QueueMessage {
            id: id.to_string(),
            pop_receipt: receipt.to_string(),
            content,
            dequeue_count: dequeue_count.max(0) as u32,
        }))
    }

    async fn delete(&self, message: &QueueMessage) -> AppResult<()> {
        let id = Uuid::parse_str(&message.id)
            .map_err(|e| AppError::with_source(ErrorKind::Queue, "Invalid message id", e))?;
        let receipt = Uuid::parse_str(&message.pop_receipt)
            .map_err(|e| AppError::with_source(ErrorKind::Queue, "Invalid pop receipt", e))?;

        let result = sqlx::query("DELETE FROM queue_messages WHERE id = $1 AND pop_receipt = $2")
            .bind(id)
            .bind(receipt)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_err("Failed to delete message", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Message {} not found or receipt expired",
                message.id
            )));
        }
        Ok(())
    }

    async fn len(&self) -> AppResult<usize> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM queue_messages WHERE queue_name = $1",
        )
        .bind(&self.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Self::map_err("Failed to count messages", e))?;
        Ok(count.max(0) as usize)
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| Self::map_err("Health check failed", e))
    }
}

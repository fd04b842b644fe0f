//! In-memory message queue with visibility timeouts.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

use deskwatch_core::error::AppError;
use deskwatch_core::result::AppResult;
use deskwatch_core::traits::queue::{MessageQueue, QueueMessage};

#[derive(Debug)]
struct StoredMessage {
    id: String,
    content: String,
    dequeue_count: u32,
    pop_receipt: Option<String>,
    visible_at: Instant,
}

/// FIFO queue kept in process memory. Clones share the same queue.
#[derive(Debug, Clone)]
pub struct MemoryQueue {
    messages: Arc<Mutex<VecDeque<StoredMessage>>>,
    visibility_timeout: Duration,
}

impl MemoryQueue {
    /// Create an empty queue.
    pub fn new(visibility_timeout: Duration) -> Self {
        Self {
            messages: Arc::new(Mutex::new(VecDeque::new())),
            visibility_timeout,
        }
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn send(&self, content: &str) -> AppResult<()> {
        self.messages.lock().await.push_back(StoredMessage {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            dequeue_count: 0,
            pop_receipt: None,
            visible_at: Instant::now(),
        });
        Ok(())
    }

    async fn receive(&self) -> AppResult<Option<QueueMessage>> {
        let now = Instant::now();
        let mut messages = self.messages.lock().await;
        let Some(message) = messages.iter_mut().find(|m| m.visible_at <= now) else {
            return Ok(None);
        };

        let receipt = Uuid::new_v4().to_string();
        message.dequeue_count += 1;
        message.pop_receipt = Some(receipt.clone());
        message.visible_at = now + self.visibility_timeout;

        Ok(Some(QueueMessage {
            id: message.id.clone(),
            pop_receipt: receipt,
            content: message.content.clone(),
            dequeue_count: message.dequeue_count,
        }))
    }

    async fn delete(&self, message: &QueueMessage) -> AppResult<()> {
        let mut messages = self.messages.lock().await;
        let position = messages.iter().position(|m| {
            m.id == message.id && m.pop_receipt.as_deref() == Some(message.pop_receipt.as_str())
        });
        match position {
            Some(index) => {
                messages.remove(index);
                Ok(())
            }
            None => Err(AppError::not_found(format!(
                "Message {} not found or receipt expired",
                message.id
            ))),
        }
    }

    async fn len(&self) -> AppResult<usize> {
        Ok(self.messages.lock().await.len())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fifo_and_ack() {
        let queue = MemoryQueue::new(Duration::from_secs(30));
        queue.send("first").await.unwrap();
        queue.send("second").await.unwrap();

        let msg = queue.receive().await.unwrap().unwrap();
        assert_eq!(msg.content, "first");
        assert_eq!(msg.dequeue_count, 1);
        queue.delete(&msg).await.unwrap();

        let msg = queue.receive().await.unwrap().unwrap();
        assert_eq!(msg.content, "second");
        queue.delete(&msg).await.unwrap();
        assert!(queue.receive().await.unwrap().is_none());
        assert_eq!(queue.len().await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unacked_message_reappears() {
        let queue = MemoryQueue::new(Duration::from_secs(30));
        queue.send("job").await.unwrap();

        let first = queue.receive().await.unwrap().unwrap();
        assert!(queue.receive().await.unwrap().is_none());

        tokio::time::advance(Duration::from_secs(31)).await;
        let second = queue.receive().await.unwrap().unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.dequeue_count, 2);
        assert!(queue.delete(&first).await.is_err());
        queue.delete(&second).await.unwrap();
    }
}

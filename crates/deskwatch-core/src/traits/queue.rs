//! Message queue trait for one-shot run requests.

use async_trait::async_trait;

use crate::result::AppResult;

/// A message handed out by [`MessageQueue::receive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Backend message id.
    pub id: String,
    /// Receipt proving this receiver owns the current delivery.
    pub pop_receipt: String,
    /// Message body.
    pub content: String,
    /// How many times the message has been delivered.
    pub dequeue_count: u32,
}

/// At-least-once FIFO queue.
///
/// A received message becomes invisible for the backend's visibility
/// timeout and reappears unless it is deleted with its receipt.
#[async_trait]
pub trait MessageQueue: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name.
    fn provider_type(&self) -> &str;

    /// Append a message.
    async fn send(&self, content: &str) -> AppResult<()>;

    /// Receive the oldest visible message, if any.
    async fn receive(&self) -> AppResult<Option<QueueMessage>>;

    /// Acknowledge a received message.
    async fn delete(&self, message: &QueueMessage) -> AppResult<()>;

    /// Approximate number of messages, visible or in flight.
    async fn len(&self) -> AppResult<usize>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}

//! Result notification delivery.

use async_trait::async_trait;
use serde::Serialize;

use crate::result::AppResult;

/// An outgoing message to a request owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers notifications. Callers log and swallow failures.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name.
    fn provider_type(&self) -> &str;

    /// Deliver one notification.
    async fn send(&self, notification: &Notification) -> AppResult<()>;
}

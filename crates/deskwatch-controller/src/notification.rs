//! [`Notifier`] implementations.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use deskwatch_core::config::NotificationConfig;
use deskwatch_core::error::{AppError, ErrorKind};
use deskwatch_core::result::AppResult;
use deskwatch_core::traits::notifier::{Notification, Notifier};

/// Writes notifications to the log. The default when no relay is set up.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn provider_type(&self) -> &str {
        "log"
    }

    async fn send(&self, notification: &Notification) -> AppResult<()> {
        info!(
            from = %notification.from,
            to = %notification.to,
            subject = %notification.subject,
            body = %notification.body,
            "Notification"
        );
        Ok(())
    }
}

/// POSTs notifications as JSON to a mail relay.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Failed to build notification client",
                    e,
                )
            })?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn provider_type(&self) -> &str {
        "webhook"
    }

    async fn send(&self, notification: &Notification) -> AppResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ExternalService,
                    format!("Notification relay at {} unreachable", self.url),
                    e,
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external(format!(
                "Notification relay answered {status}"
            )));
        }
        info!(to = %notification.to, "Notification delivered");
        Ok(())
    }
}

/// Build the notifier selected by `provider`.
pub fn build_notifier(config: &NotificationConfig) -> AppResult<Arc<dyn Notifier>> {
    match config.provider.as_str() {
        "log" => Ok(Arc::new(LogNotifier)),
        "webhook" => {
            let url = config.webhook_url.as_deref().ok_or_else(|| {
                AppError::configuration("notification.webhook_url is required for the webhook provider")
            })?;
            Ok(Arc::new(WebhookNotifier::new(
                url,
                Duration::from_secs(config.timeout_seconds),
            )?))
        }
        other => Err(AppError::configuration(format!(
            "Unknown notification provider '{other}'"
        ))),
    }
}

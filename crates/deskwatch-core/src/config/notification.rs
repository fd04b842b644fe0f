//! Result notification configuration.

use serde::{Deserialize, Serialize};

/// How result mails are delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// `"log"` writes notifications to the log, `"webhook"` POSTs them.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Target URL for the webhook provider.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Sender address placed in outgoing messages.
    #[serde(default = "default_sender")]
    pub sender: String,
    /// Subject line of outgoing messages.
    #[serde(default = "default_subject")]
    pub subject: String,
    /// Webhook request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            webhook_url: None,
            sender: default_sender(),
            subject: default_subject(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_provider() -> String {
    "log".to_string()
}

fn default_sender() -> String {
    "deskwatch@localhost".to_string()
}

fn default_subject() -> String {
    "IND Datum gevonden!".to_string()
}

fn default_timeout() -> u64 {
    10
}

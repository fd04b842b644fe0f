//! Run-request queue configuration.

use serde::{Deserialize, Serialize};

/// Queue configuration. The backend connection settings are shared with
/// the table store section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Backend name: `"memory"`, `"postgres"` or `"redis"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Queue name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Seconds a received message stays invisible before redelivery.
    #[serde(default = "default_visibility_timeout")]
    pub visibility_timeout_seconds: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            name: default_name(),
            visibility_timeout_seconds: default_visibility_timeout(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_name() -> String {
    "run-once-queue".to_string()
}

fn default_visibility_timeout() -> u64 {
    30
}

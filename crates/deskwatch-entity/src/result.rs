//! Stored job results.

use deskwatch_core::types::timestamp::{self, Timestamp};
use serde::{Deserialize, Serialize};

/// A result keyed by the request id the client polls with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub run_id: String,
    /// Raw comma-separated result text from the worker.
    pub result: String,
    #[serde(with = "timestamp::required")]
    pub stored_at: Timestamp,
}

impl ResultRecord {
    /// Whether the record has outlived `retention`.
    pub fn is_expired(&self, now: Timestamp, retention: chrono::Duration) -> bool {
        now - self.stored_at > retention
    }
}

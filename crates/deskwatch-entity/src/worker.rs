//! Registered worker row.

use deskwatch_core::types::timestamp::{self, Timestamp};
use deskwatch_core::types::WorkerId;
use serde::{Deserialize, Serialize};

/// A worker as persisted in the `RegisteredWorkers` partition.
///
/// Every controller writes rows for its own workers; peers read them for
/// load accounting and orphan detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRecord {
    /// Worker identifier (also the row key).
    pub worker_id: WorkerId,
    /// `host:port` the worker listens on.
    pub address: String,
    /// Last successful heartbeat.
    #[serde(with = "timestamp::required")]
    pub last_heartbeat: Timestamp,
}

impl WorkerRecord {
    /// Whether the last heartbeat is older than `threshold`.
    pub fn is_stale(&self, now: Timestamp, threshold: chrono::Duration) -> bool {
        now - self.last_heartbeat > threshold
    }
}

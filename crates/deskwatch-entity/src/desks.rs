//! Cached desk list.

use deskwatch_core::types::timestamp::{self, Timestamp};
use serde::{Deserialize, Serialize};

/// The singleton `Desks` row produced by a get-desks job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesksCache {
    /// Comma-joined desk names as returned by the worker.
    pub desks: String,
    #[serde(with = "timestamp::required")]
    pub checked_at: Timestamp,
}

impl DesksCache {
    /// A cache entry is valid while younger than `ttl`.
    pub fn is_fresh(&self, now: Timestamp, ttl: chrono::Duration) -> bool {
        now - self.checked_at < ttl
    }

    /// Individual desk names.
    pub fn desk_names(&self) -> Vec<String> {
        self.desks
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .collect()
    }
}

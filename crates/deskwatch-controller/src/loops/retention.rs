//! Result retention sweep.

use tracing::{debug, info};

use deskwatch_core::result::AppResult;
use deskwatch_core::types::timestamp;

use crate::controller::Controller;

impl Controller {
    /// Delete results older than the retention window. Returns how many
    /// were removed; always 0 when retention is disabled.
    pub async fn retention_tick(&self) -> AppResult<usize> {
        let Some(retention) = self.config().result_retention() else {
            return Ok(0);
        };
        let now = timestamp::now();
        let mut removed = 0;
        for result in self.repos().results.list().await? {
            if result.is_expired(now, retention) && self.repos().results.delete(&result.run_id).await? {
                debug!(run_id = %result.run_id, "Result expired");
                removed += 1;
            }
        }
        if removed > 0 {
            info!(removed, "Swept expired results");
        }
        Ok(removed)
    }
}

//! Worker liveness.

use futures::future::join_all;
use tracing::{debug, warn};

use deskwatch_core::result::AppResult;
use deskwatch_core::types::WorkerId;
use deskwatch_core::types::timestamp::{self, Timestamp};

use crate::controller::Controller;

/// Outcome of one heartbeat tick.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HeartbeatReport {
    /// Local workers that were pinged.
    pub checked: usize,
    /// Local workers that answered.
    pub refreshed: usize,
    /// Local workers dropped for staying silent past the timeout.
    pub dropped: Vec<WorkerId>,
    /// Peer workers handed to orphan handling.
    pub orphans: usize,
}

impl Controller {
    /// Ping every local worker whose heartbeat is stale, then sweep the
    /// synced view for orphans.
    pub async fn heartbeat_tick(&self) -> AppResult<HeartbeatReport> {
        let now = timestamp::now();
        let heartbeat_time = self.config().heartbeat_time();
        let due: Vec<(WorkerId, String, Timestamp)> = self
            .registry()
            .lock()
            .await
            .iter()
            .filter(|w| now - w.last_heartbeat > heartbeat_time)
            .map(|w| (w.id, w.address.clone(), w.last_heartbeat))
            .collect();

        let mut report = HeartbeatReport {
            checked: due.len(),
            ..Default::default()
        };

        let answers = join_all(due.into_iter().map(|(id, address, last)| async move {
            let answer = self.client().heartbeat(&address).await;
            (id, last, answer)
        }))
        .await;

        for (id, last, answer) in answers {
            match answer {
                Ok(()) => {
                    debug!(worker_id = %id, "Heartbeat ok");
                    if let Err(e) = self.refresh_heartbeat(id, timestamp::now()).await {
                        warn!(worker_id = %id, error = %e, "Failed to persist heartbeat");
                    }
                    report.refreshed += 1;
                }
                Err(e) if now - last > self.config().worker_timeout() => {
                    warn!(
                        worker_id = %id,
                        error = %e,
                        last_heartbeat = %timestamp::format(&last),
                        "Worker timed out, unregistering"
                    );
                    if let Err(e) = self.drop_worker(id).await {
                        warn!(worker_id = %id, error = %e, "Failed to unregister worker");
                    }
                    report.dropped.push(id);
                }
                Err(e) => {
                    debug!(worker_id = %id, error = %e, "Heartbeat failed, worker within timeout");
                }
            }
        }

        let orphans = self
            .synced()
            .lock()
            .await
            .stale(now, self.config().orphan_threshold());
        for record in orphans {
            self.handle_orphan(record).await;
            report.orphans += 1;
        }

        Ok(report)
    }
}

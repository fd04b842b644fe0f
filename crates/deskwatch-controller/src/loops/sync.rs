//! Mirror of peer-owned workers and orphan adoption.

use tracing::{debug, info, warn};

use deskwatch_core::result::AppResult;
use deskwatch_core::types::timestamp;
use deskwatch_entity::worker::WorkerRecord;

use crate::controller::Controller;
use crate::registry::Worker;

/// Outcome of one sync tick.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Synced workers after the tick.
    pub tracked: usize,
    pub added: usize,
    pub dropped: usize,
    pub orphans: Vec<OrphanOutcome>,
}

/// What orphan handling did with a stale peer worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanOutcome {
    Adopted,
    Removed,
}

impl Controller {
    /// Reconcile the synced view with the worker rows in the store.
    pub async fn sync_tick(&self) -> AppResult<SyncReport> {
        let rows = self.repos().workers.list().await?;
        let present: Vec<_> = rows.iter().map(|r| r.worker_id).collect();
        let local = self.registry().lock().await.ids();
        let now = timestamp::now();
        let threshold = self.config().orphan_threshold();

        let mut report = SyncReport::default();
        let mut orphans = Vec::new();
        {
            let mut synced = self.synced().lock().await;
            let dropped = synced.retain_present(&present);
            report.dropped = dropped.len();
            for row in rows {
                if local.contains(&row.worker_id) {
                    continue;
                }
                if synced.contains(row.worker_id) {
                    synced.upsert(row);
                } else if row.is_stale(now, threshold) {
                    orphans.push(row);
                } else {
                    debug!(worker_id = %row.worker_id, address = %row.address, "Tracking peer worker");
                    synced.upsert(row);
                    report.added += 1;
                }
            }
            report.tracked = synced.len();
        }

        for record in orphans {
            report.orphans.push(self.handle_orphan(record).await);
        }
        Ok(report)
    }

    /// Try to take over a worker whose controller stopped heartbeating it.
    pub async fn handle_orphan(&self, record: WorkerRecord) -> OrphanOutcome {
        let id = record.worker_id;
        let answer = match self.client().heartbeat(&record.address).await {
            Ok(()) => {
                self.client()
                    .adopt(&record.address, self.advertise_address())
                    .await
            }
            Err(e) => Err(e),
        };

        match answer {
            Ok(()) => {
                let mut worker = Worker::from_record(&record);
                worker.last_heartbeat = timestamp::now();
                let refreshed = worker.record();
                self.synced().lock().await.remove(id);
                self.registry().lock().await.insert(worker);
                if let Err(e) = self.repos().workers.save(&refreshed).await {
                    warn!(worker_id = %id, error = %e, "Failed to persist adopted worker");
                }
                info!(worker_id = %id, address = %record.address, "Adopted orphaned worker");
                OrphanOutcome::Adopted
            }
            Err(e) => {
                warn!(
                    worker_id = %id,
                    address = %record.address,
                    error = %e,
                    "Orphaned worker could not be adopted, removing"
                );
                if let Err(e) = self.repos().workers.delete(id).await {
                    warn!(worker_id = %id, error = %e, "Failed to delete orphaned worker");
                }
                self.synced().lock().await.remove(id);
                OrphanOutcome::Removed
            }
        }
    }
}

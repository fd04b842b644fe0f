//! Read-only view of workers owned by peer controllers.

use std::collections::BTreeMap;

use deskwatch_core::types::WorkerId;
use deskwatch_core::types::timestamp::Timestamp;
use deskwatch_entity::worker::WorkerRecord;

/// Peer workers keyed by id, refreshed from the store every sync tick.
#[derive(Debug, Default)]
pub struct SyncedWorkers {
    workers: BTreeMap<WorkerId, WorkerRecord>,
}

impl SyncedWorkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh a row.
    pub fn upsert(&mut self, record: WorkerRecord) {
        self.workers.insert(record.worker_id, record);
    }

    pub fn remove(&mut self, id: WorkerId) -> Option<WorkerRecord> {
        self.workers.remove(&id)
    }

    pub fn contains(&self, id: WorkerId) -> bool {
        self.workers.contains_key(&id)
    }

    /// Drop every worker not in `present`. Returns the dropped ids.
    pub fn retain_present(&mut self, present: &[WorkerId]) -> Vec<WorkerId> {
        let gone: Vec<WorkerId> = self
            .workers
            .keys()
            .filter(|id| !present.contains(*id))
            .copied()
            .collect();
        for id in &gone {
            self.workers.remove(id);
        }
        gone
    }

    /// Workers whose heartbeat is older than `threshold`.
    pub fn stale(&self, now: Timestamp, threshold: chrono::Duration) -> Vec<WorkerRecord> {
        self.workers
            .values()
            .filter(|w| w.is_stale(now, threshold))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn records(&self) -> Vec<WorkerRecord> {
        self.workers.values().cloned().collect()
    }
}

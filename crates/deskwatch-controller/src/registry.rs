//! Workers owned by this controller.

use serde::Serialize;

use deskwatch_core::types::timestamp::{self, Timestamp};
use deskwatch_core::types::{JobId, WorkerId};
use deskwatch_entity::job::JobRecord;
use deskwatch_entity::worker::WorkerRecord;

/// A worker registered to (or adopted by) this controller.
#[derive(Debug, Clone)]
pub struct Worker {
    pub id: WorkerId,
    pub address: String,
    pub last_heartbeat: Timestamp,
    /// Live jobs in assignment order.
    pub jobs: Vec<JobRecord>,
    pub last_job_started_at: Option<Timestamp>,
    /// Timeouts and failed dispatches so far. Never reset.
    pub errors: u32,
}

impl Worker {
    /// A worker with no jobs.
    pub fn new(id: WorkerId, address: impl Into<String>, last_heartbeat: Timestamp) -> Self {
        Self {
            id,
            address: address.into(),
            last_heartbeat,
            jobs: Vec::new(),
            last_job_started_at: None,
            errors: 0,
        }
    }

    /// Rebuild a worker from its store row (adoption).
    pub fn from_record(record: &WorkerRecord) -> Self {
        Self::new(record.worker_id, record.address.clone(), record.last_heartbeat)
    }

    /// The row persisted for this worker.
    pub fn record(&self) -> WorkerRecord {
        WorkerRecord {
            worker_id: self.id,
            address: self.address.clone(),
            last_heartbeat: self.last_heartbeat,
        }
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn has_job(&self, job_id: JobId) -> bool {
        self.jobs.iter().any(|job| job.job_id == job_id)
    }

    /// Remove a job from the worker's map.
    pub fn take_job(&mut self, job_id: JobId) -> Option<JobRecord> {
        let index = self.jobs.iter().position(|job| job.job_id == job_id)?;
        Some(self.jobs.remove(index))
    }

    /// Remove and return every job older than `timeout`.
    pub fn take_timed_out(&mut self, now: Timestamp, timeout: chrono::Duration) -> Vec<JobRecord> {
        let (expired, live): (Vec<JobRecord>, Vec<JobRecord>) = std::mem::take(&mut self.jobs)
            .into_iter()
            .partition(|job| job.is_timed_out(now, timeout));
        self.jobs = live;
        expired
    }

    pub fn snapshot(&self) -> WorkerSnapshot {
        WorkerSnapshot {
            id: self.id,
            address: self.address.clone(),
            last_heartbeat: timestamp::format(&self.last_heartbeat),
            jobs: self.jobs.iter().map(|job| job.job_id).collect(),
            last_job_started_at: self.last_job_started_at.as_ref().map(timestamp::format),
            errors: self.errors,
        }
    }
}

/// Point-in-time copy of a worker, safe to use without the registry lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerSnapshot {
    pub id: WorkerId,
    pub address: String,
    pub last_heartbeat: String,
    pub jobs: Vec<JobId>,
    pub last_job_started_at: Option<String>,
    pub errors: u32,
}

/// Assignment limits applied by [`WorkerRegistry::first_ready`].
#[derive(Debug, Clone, Copy)]
pub struct Readiness {
    pub max_jobs: usize,
    pub cooldown: chrono::Duration,
}

/// Whether a worker may take the next job.
///
/// It must hold the fewest jobs of all local workers, hold no more than
/// `max_jobs`, and not have been handed a job within the cooldown.
pub fn is_ready(
    job_count: usize,
    min_job_count: usize,
    last_job_started_at: Option<Timestamp>,
    now: Timestamp,
    limits: Readiness,
) -> bool {
    if job_count != min_job_count || job_count > limits.max_jobs {
        return false;
    }
    match last_job_started_at {
        None => true,
        Some(started) => now - started > limits.cooldown,
    }
}

/// Ordered registry of local workers.
#[derive(Debug, Default)]
pub struct WorkerRegistry {
    workers: Vec<Worker>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a worker, or update the address and heartbeat of a known
    /// one. Returns `true` for a new worker.
    pub fn register(&mut self, id: WorkerId, address: &str, now: Timestamp) -> bool {
        match self.get_mut(id) {
            Some(worker) => {
                worker.address = address.to_string();
                worker.last_heartbeat = now;
                false
            }
            None => {
                self.workers.push(Worker::new(id, address, now));
                true
            }
        }
    }

    /// Add an adopted worker.
    pub fn insert(&mut self, worker: Worker) {
        if let Some(existing) = self.get_mut(worker.id) {
            *existing = worker;
        } else {
            self.workers.push(worker);
        }
    }

    pub fn remove(&mut self, id: WorkerId) -> Option<Worker> {
        let index = self.workers.iter().position(|w| w.id == id)?;
        Some(self.workers.remove(index))
    }

    pub fn get(&self, id: WorkerId) -> Option<&Worker> {
        self.workers.iter().find(|w| w.id == id)
    }

    pub fn get_mut(&mut self, id: WorkerId) -> Option<&mut Worker> {
        self.workers.iter_mut().find(|w| w.id == id)
    }

    pub fn contains(&self, id: WorkerId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Worker> {
        self.workers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Worker> {
        self.workers.iter_mut()
    }

    pub fn ids(&self) -> Vec<WorkerId> {
        self.workers.iter().map(|w| w.id).collect()
    }

    /// Smallest job count across local workers.
    pub fn min_job_count(&self) -> Option<usize> {
        self.workers.iter().map(Worker::job_count).min()
    }

    /// First worker, in registration order, that may take a job.
    pub fn first_ready(&self, now: Timestamp, limits: Readiness) -> Option<&Worker> {
        let min = self.min_job_count()?;
        self.workers
            .iter()
            .find(|w| is_ready(w.job_count(), min, w.last_job_started_at, now, limits))
    }

    /// Whether any local worker holds `job_id`.
    pub fn owns_job(&self, job_id: JobId) -> bool {
        self.workers.iter().any(|w| w.has_job(job_id))
    }

    /// Remove a job from whichever worker holds it.
    pub fn take_job(&mut self, job_id: JobId) -> Option<(WorkerId, JobRecord)> {
        self.workers
            .iter_mut()
            .find_map(|w| w.take_job(job_id).map(|job| (w.id, job)))
    }

    /// Request ids with a live job on a local worker.
    pub fn live_run_ids(&self) -> Vec<String> {
        self.workers
            .iter()
            .flat_map(|w| w.jobs.iter())
            .filter_map(|job| job.run_id().map(str::to_string))
            .collect()
    }

    pub fn snapshots(&self) -> Vec<WorkerSnapshot> {
        self.workers.iter().map(Worker::snapshot).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskwatch_entity::job::{JobArgs, JobType};

    fn limits() -> Readiness {
        Readiness {
            max_jobs: 2,
            cooldown: chrono::Duration::seconds(3),
        }
    }

    fn job(worker: WorkerId, started: Timestamp) -> JobRecord {
        JobRecord {
            job_id: JobId::new(),
            job_type: JobType::GetDesks,
            assigned_worker: worker,
            controller: None,
            email: None,
            args: JobArgs::check_desks(),
            started,
        }
    }

    #[test]
    fn test_least_loaded_worker_is_ready() {
        let now = timestamp::now();
        let mut registry = WorkerRegistry::new();
        let busy = WorkerId::new();
        let idle = WorkerId::new();
        registry.register(busy, "10.0.0.1:5003", now);
        registry.register(idle, "10.0.0.2:5003", now);
        registry.get_mut(busy).unwrap().jobs.push(job(busy, now));

        let ready = registry.first_ready(now, limits()).unwrap();
        assert_eq!(ready.id, idle);
    }

    #[test]
    fn test_cap_blocks_only_above_max_jobs() {
        let now = timestamp::now();
        let mut registry = WorkerRegistry::new();
        let id = WorkerId::new();
        registry.register(id, "10.0.0.1:5003", now);
        let worker = registry.get_mut(id).unwrap();
        worker.jobs.push(job(id, now));
        worker.jobs.push(job(id, now));
        assert_eq!(registry.first_ready(now, limits()).unwrap().id, id);

        registry.get_mut(id).unwrap().jobs.push(job(id, now));
        assert!(registry.first_ready(now, limits()).is_none());
    }

    #[test]
    fn test_idle_worker_ready_with_zero_cap() {
        let now = timestamp::now();
        let zero = Readiness {
            max_jobs: 0,
            ..limits()
        };
        assert!(is_ready(0, 0, None, now, zero));
        assert!(!is_ready(1, 1, None, now, zero));
    }

    #[test]
    fn test_cooldown_after_assignment() {
        let now = timestamp::now();
        assert!(!is_ready(0, 0, Some(now), now + chrono::Duration::seconds(3), limits()));
        assert!(is_ready(0, 0, Some(now), now + chrono::Duration::seconds(4), limits()));
        assert!(is_ready(0, 0, None, now, limits()));
    }

    #[test]
    fn test_reregistration_replaces_address_and_keeps_jobs() {
        let now = timestamp::now();
        let mut registry = WorkerRegistry::new();
        let id = WorkerId::new();
        assert!(registry.register(id, "10.0.0.1:5003", now));
        registry.get_mut(id).unwrap().jobs.push(job(id, now));
        let later = now + chrono::Duration::seconds(20);
        assert!(!registry.register(id, "10.0.0.7:5003", later));

        let worker = registry.get(id).unwrap();
        assert_eq!(worker.address, "10.0.0.7:5003");
        assert_eq!(worker.last_heartbeat, later);
        assert_eq!(worker.job_count(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_take_timed_out_keeps_order_of_live_jobs() {
        let now = timestamp::now();
        let id = WorkerId::new();
        let mut worker = Worker::new(id, "a:1", now);
        let old = job(id, now - chrono::Duration::seconds(400));
        let fresh_a = job(id, now);
        let fresh_b = job(id, now);
        worker.jobs = vec![fresh_a.clone(), old.clone(), fresh_b.clone()];

        let expired = worker.take_timed_out(now, chrono::Duration::seconds(300));
        assert_eq!(expired, vec![old]);
        assert_eq!(worker.jobs, vec![fresh_a, fresh_b]);
    }

    #[test]
    fn test_take_job_across_workers() {
        let now = timestamp::now();
        let mut registry = WorkerRegistry::new();
        let a = WorkerId::new();
        let b = WorkerId::new();
        registry.register(a, "a:1", now);
        registry.register(b, "b:1", now);
        let j = job(b, now);
        registry.get_mut(b).unwrap().jobs.push(j.clone());

        assert!(registry.owns_job(j.job_id));
        assert_eq!(registry.take_job(j.job_id), Some((b, j.clone())));
        assert!(!registry.owns_job(j.job_id));
        assert!(registry.take_job(j.job_id).is_none());
    }
}

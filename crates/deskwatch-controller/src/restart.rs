//! Jobs waiting to be dispatched again.

use std::collections::VecDeque;

use serde::Serialize;

use deskwatch_core::types::JobId;
use deskwatch_core::types::timestamp;
use deskwatch_entity::job::{JobRecord, JobType};

/// A job that timed out or lost its worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRestart {
    pub job: JobRecord,
    /// Failed attempts to dispatch this restart.
    pub failures: u32,
}

/// FIFO of pending restarts, at most one entry per job id.
#[derive(Debug, Default)]
pub struct RestartQueue {
    pending: VecDeque<PendingRestart>,
}

impl RestartQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a job. Returns `false` if it is already pending.
    pub fn push(&mut self, job: JobRecord) -> bool {
        if self.contains(job.job_id) {
            return false;
        }
        self.pending.push_back(PendingRestart { job, failures: 0 });
        true
    }

    /// Put a restart whose dispatch failed back at the end of the queue.
    pub fn requeue(&mut self, restart: PendingRestart) {
        if !self.contains(restart.job.job_id) {
            self.pending.push_back(restart);
        }
    }

    /// Oldest pending restart.
    pub fn pop(&mut self) -> Option<PendingRestart> {
        self.pending.pop_front()
    }

    /// Withdraw a pending restart, e.g. because its result arrived late.
    pub fn cancel(&mut self, job_id: JobId) -> Option<JobRecord> {
        let index = self.pending.iter().position(|p| p.job.job_id == job_id)?;
        self.pending.remove(index).map(|p| p.job)
    }

    pub fn contains(&self, job_id: JobId) -> bool {
        self.pending.iter().any(|p| p.job.job_id == job_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn job_ids(&self) -> Vec<JobId> {
        self.pending.iter().map(|p| p.job.job_id).collect()
    }

    pub fn live_run_ids(&self) -> Vec<String> {
        self.pending
            .iter()
            .filter_map(|p| p.job.run_id().map(str::to_string))
            .collect()
    }

    pub fn snapshots(&self) -> Vec<RestartSnapshot> {
        self.pending
            .iter()
            .map(|p| RestartSnapshot {
                job_id: p.job.job_id,
                job_type: p.job.job_type,
                run_id: p.job.run_id().map(str::to_string),
                started: timestamp::format(&p.job.started),
                failures: p.failures,
            })
            .collect()
    }
}

/// Serializable view of a pending restart.
#[derive(Debug, Clone, Serialize)]
pub struct RestartSnapshot {
    pub job_id: JobId,
    pub job_type: JobType,
    pub run_id: Option<String>,
    pub started: String,
    pub failures: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskwatch_core::types::WorkerId;
    use deskwatch_entity::job::JobArgs;

    fn job() -> JobRecord {
        JobRecord {
            job_id: JobId::new(),
            job_type: JobType::GetDesks,
            assigned_worker: WorkerId::new(),
            controller: None,
            email: None,
            args: JobArgs::check_desks(),
            started: timestamp::now(),
        }
    }

    #[test]
    fn test_push_deduplicates() {
        let mut queue = RestartQueue::new();
        let j = job();
        assert!(queue.push(j.clone()));
        assert!(!queue.push(j.clone()));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_fifo_and_cancel() {
        let mut queue = RestartQueue::new();
        let (a, b, c) = (job(), job(), job());
        queue.push(a.clone());
        queue.push(b.clone());
        queue.push(c.clone());

        assert_eq!(queue.cancel(b.job_id), Some(b));
        assert_eq!(queue.pop().unwrap().job, a);
        assert_eq!(queue.pop().unwrap().job, c);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_requeue_keeps_failure_count() {
        let mut queue = RestartQueue::new();
        queue.push(job());
        let mut restart = queue.pop().unwrap();
        restart.failures += 1;
        queue.requeue(restart);
        assert_eq!(queue.pop().unwrap().failures, 1);
    }
}

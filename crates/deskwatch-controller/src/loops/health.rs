//! Job timeouts and reclaiming abandoned jobs.

use std::collections::HashSet;

use tracing::{info, warn};

use deskwatch_core::result::AppResult;
use deskwatch_core::types::timestamp;
use deskwatch_core::types::{JobId, WorkerId};

use crate::controller::Controller;

/// Outcome of one health tick.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HealthReport {
    /// Own jobs that timed out and were queued for restart.
    pub timed_out: Vec<JobId>,
    /// Abandoned jobs of other controllers claimed for restart.
    pub claimed: Vec<JobId>,
    /// Workers shut down after exhausting their error budget.
    pub shut_down: Vec<WorkerId>,
}

impl Controller {
    pub async fn health_tick(&self) -> AppResult<HealthReport> {
        let mut report = HealthReport::default();
        self.reclaim_timed_out(&mut report).await;
        self.claim_abandoned(&mut report).await?;
        Ok(report)
    }

    async fn reclaim_timed_out(&self, report: &mut HealthReport) {
        let now = timestamp::now();
        let timeout = self.config().job_timeout();
        let max_errors = self.config().max_worker_errors;

        let mut exhausted = Vec::new();
        {
            let mut registry = self.registry().lock().await;
            let mut restarts = self.restarts().lock().await;
            for worker in registry.iter_mut() {
                let expired = worker.take_timed_out(now, timeout);
                if expired.is_empty() {
                    continue;
                }
                worker.errors += expired.len() as u32;
                for job in expired {
                    warn!(
                        job_id = %job.job_id,
                        worker_id = %worker.id,
                        job_type = %job.job_type,
                        "Job timed out, queueing restart"
                    );
                    report.timed_out.push(job.job_id);
                    restarts.push(job);
                }
                if worker.errors >= max_errors {
                    exhausted.push(worker.id);
                }
            }
        }

        for id in exhausted {
            warn!(worker_id = %id, "Worker exceeded its error budget, shutting it down");
            if let Err(e) = self.shutdown_worker(id).await {
                warn!(worker_id = %id, error = %e, "Failed to shut down worker");
            }
            report.shut_down.push(id);
        }
    }

    async fn claim_abandoned(&self, report: &mut HealthReport) -> AppResult<()> {
        let now = timestamp::now();
        let timeout = self.config().foreign_job_timeout();
        let rows = self.repos().jobs.list().await?;

        let candidates: Vec<_> = {
            let registry = self.registry().lock().await;
            let restarts = self.restarts().lock().await;
            let pending: HashSet<JobId> = restarts.job_ids().into_iter().collect();
            rows.into_iter()
                .filter(|job| job.is_timed_out(now, timeout))
                .filter(|job| !registry.owns_job(job.job_id) && !pending.contains(&job.job_id))
                .collect()
        };

        for mut job in candidates {
            job.started = now;
            if let Err(e) = self.repos().jobs.save(&job).await {
                warn!(job_id = %job.job_id, error = %e, "Failed to claim abandoned job");
                continue;
            }
            info!(
                job_id = %job.job_id,
                worker_id = %job.assigned_worker,
                controller = job.controller.as_deref().unwrap_or("-"),
                "Claimed abandoned job for restart"
            );
            report.claimed.push(job.job_id);
            self.restarts().lock().await.push(job);
        }
        Ok(())
    }
}

//! Handling results returned by workers.

use tracing::{info, warn};

use deskwatch_core::result::AppResult;
use deskwatch_core::traits::notifier::Notification;
use deskwatch_core::types::JobId;
use deskwatch_core::types::timestamp;
use deskwatch_entity::desks::DesksCache;
use deskwatch_entity::job::{JobRecord, JobType};
use deskwatch_entity::result::ResultRecord;

use crate::controller::Controller;

/// What happened to a returned result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The job was known and its result was handled.
    Completed { job_type: JobType },
    /// No live, pending or stored job has this id; the result was dropped.
    Unknown,
}

impl Controller {
    /// Complete a job with the result its worker returned.
    pub async fn complete(&self, job_id: JobId, result: &str) -> AppResult<Completion> {
        let Some(job) = self.claim_finished(job_id).await? else {
            info!(job_id = %job_id, "Result for unknown job, ignoring");
            return Ok(Completion::Unknown);
        };

        self.repos().jobs.delete(job_id).await?;

        match job.job_type {
            JobType::RunOnce => self.complete_run_once(&job, result).await?,
            JobType::GetDesks => self.complete_get_desks(result).await?,
            JobType::Continuous => self.complete_continuous(&job, result).await?,
        }

        info!(job_id = %job_id, job_type = %job.job_type, "Job completed");
        Ok(Completion::Completed {
            job_type: job.job_type,
        })
    }

    /// Take the job out of whichever place tracks it.
    async fn claim_finished(&self, job_id: JobId) -> AppResult<Option<JobRecord>> {
        if let Some((_, job)) = self.registry().lock().await.take_job(job_id) {
            return Ok(Some(job));
        }
        if let Some(job) = self.restarts().lock().await.cancel(job_id) {
            info!(job_id = %job_id, "Late result cancels pending restart");
            return Ok(Some(job));
        }
        // Dispatched by a controller that is gone; its worker now reports here.
        self.repos().jobs.find(job_id).await
    }

    async fn complete_run_once(&self, job: &JobRecord, result: &str) -> AppResult<()> {
        let Some(run_id) = job.run_id() else {
            warn!(job_id = %job.job_id, "Run-once job without run id, result dropped");
            return Ok(());
        };
        self.store_result(run_id, result).await
    }

    async fn complete_get_desks(&self, result: &str) -> AppResult<()> {
        self.repos()
            .desks
            .save(&DesksCache {
                desks: result.to_string(),
                checked_at: timestamp::now(),
            })
            .await
    }

    async fn complete_continuous(&self, job: &JobRecord, result: &str) -> AppResult<()> {
        let Some(run_id) = job.run_id() else {
            warn!(job_id = %job.job_id, "Continuous job without run id, result dropped");
            return Ok(());
        };
        let request = self.repos().continuous.find(run_id).await?;

        if result.trim().is_empty() {
            if let Some(mut request) = request {
                request.error_count = 0;
                self.repos().continuous.save(&request).await?;
            }
            return Ok(());
        }

        self.store_result(run_id, result).await?;
        let target = request
            .as_ref()
            .and_then(|r| r.notify_target())
            .or_else(|| job.email.clone());
        if let Some(to) = target {
            self.notify(&to, result).await;
        }
        if request.is_some() {
            self.repos().continuous.delete(run_id).await?;
            info!(run_id, "Continuous request satisfied and removed");
        }
        Ok(())
    }

    async fn store_result(&self, run_id: &str, result: &str) -> AppResult<()> {
        self.repos()
            .results
            .save(&ResultRecord {
                run_id: run_id.to_string(),
                result: result.to_string(),
                stored_at: timestamp::now(),
            })
            .await
    }

    /// Send a result to its owner. Failures are logged and swallowed.
    async fn notify(&self, to: &str, result: &str) {
        let notification = Notification {
            from: self.notification().sender.clone(),
            to: to.to_string(),
            subject: self.notification().subject.clone(),
            body: notification_body(result),
        };
        if let Err(e) = self.notifier().send(&notification).await {
            warn!(to, error = %e, "Failed to deliver result notification");
        }
    }
}

/// One found slot per line.
pub fn notification_body(result: &str) -> String {
    result
        .split(',')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_body_one_slot_per_line() {
        assert_eq!(
            notification_body("01/07 09:00, 02/07 10:30"),
            "01/07 09:00\n02/07 10:30"
        );
    }
}

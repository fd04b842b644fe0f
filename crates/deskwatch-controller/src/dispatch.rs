//! Starting jobs on workers.

use tracing::{info, warn};

use deskwatch_core::error::{AppError, ErrorKind};
use deskwatch_core::result::AppResult;
use deskwatch_core::types::timestamp;
use deskwatch_core::types::{JobId, WorkerId};
use deskwatch_entity::job::{JobArgs, JobRecord, JobType};

use crate::controller::Controller;

impl Controller {
    /// Start a job on a local worker.
    ///
    /// A transport failure or a non-`OK` answer means nothing was assigned:
    /// the failure is counted against the worker and returned to the
    /// caller's retry accounting. On success the job is recorded on the
    /// worker and in the store under a fresh id. Once the worker has
    /// accepted, the call succeeds even if the store row cannot be written;
    /// the job is then tracked in memory only.
    pub async fn start_job(
        &self,
        worker_id: WorkerId,
        job_type: JobType,
        args: JobArgs,
        email: Option<String>,
    ) -> AppResult<JobRecord> {
        let address = self
            .registry()
            .lock()
            .await
            .get(worker_id)
            .map(|w| w.address.clone())
            .ok_or_else(|| AppError::not_found(format!("Worker {worker_id} is not registered")))?;

        let now = timestamp::now();
        let job = JobRecord {
            job_id: JobId::new(),
            job_type,
            assigned_worker: worker_id,
            controller: Some(self.advertise_address().to_string()),
            email,
            args,
            started: now,
        };

        if let Err(e) = self.client().start_job(&address, &job.payload()).await {
            warn!(
                worker_id = %worker_id,
                job_type = %job_type,
                error = %e,
                "Could not start job on worker"
            );
            if let Err(err) = self.record_worker_failure(worker_id).await {
                warn!(worker_id = %worker_id, error = %err, "Failed to record worker failure");
            }
            return Err(AppError::with_source(
                ErrorKind::ExternalService,
                format!("Worker {worker_id} did not accept the job"),
                e,
            ));
        }

        let still_registered = {
            let mut registry = self.registry().lock().await;
            match registry.get_mut(worker_id) {
                Some(worker) => {
                    worker.last_job_started_at = Some(now);
                    worker.jobs.push(job.clone());
                    true
                }
                None => false,
            }
        };
        if !still_registered {
            warn!(
                worker_id = %worker_id,
                job_id = %job.job_id,
                "Worker left while the job was starting; the stored job will be reclaimed"
            );
        }

        if let Err(e) = self.repos().jobs.create(&job).await {
            warn!(
                job_id = %job.job_id,
                worker_id = %worker_id,
                error = %e,
                "Job accepted by worker but not persisted"
            );
        }
        info!(
            job_id = %job.job_id,
            worker_id = %worker_id,
            job_type = %job_type,
            run_id = job.run_id().unwrap_or("-"),
            "Job started"
        );
        Ok(job)
    }
}

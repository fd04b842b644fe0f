//! Job distribution.
//!
//! One unit of work per tick. A pending restart always goes first;
//! otherwise ticks with a ready worker alternate between the run-once
//! queue and the continuous requests in the store.

use std::collections::HashSet;
use std::sync::atomic::Ordering;

use tracing::{debug, info, warn};

use deskwatch_core::result::AppResult;
use deskwatch_core::traits::queue::MessageQueue;
use deskwatch_core::types::timestamp;
use deskwatch_core::types::{JobId, Timestamp, WorkerId};
use deskwatch_entity::continuous::ContinuousRunRequest;
use deskwatch_entity::job::JobType;
use deskwatch_entity::request::QueueRequest;

use crate::controller::Controller;
use crate::registry::Readiness;
use crate::restart::PendingRestart;

/// What a distribution tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Distribution {
    /// No local worker may take a job right now.
    NoReadyWorker,
    /// Nothing to dispatch from the chosen source.
    Idle,
    /// A pending restart was dispatched as a new job.
    Restarted { previous: JobId, job_id: JobId },
    /// A queue message or continuous request was dispatched.
    Dispatched { job_id: JobId, job_type: JobType },
    /// Dispatch failed; the unit was returned for another attempt.
    Retried,
    /// Dispatch failed and the error budget is spent, or the unit was
    /// malformed; it was discarded.
    Dropped,
}

impl Controller {
    pub async fn distribution_tick(&self) -> AppResult<Distribution> {
        let now = timestamp::now();
        let limits = Readiness {
            max_jobs: self.config().max_number_of_jobs,
            cooldown: self.config().worker_cooldown(),
        };
        let Some(worker_id) = self
            .registry()
            .lock()
            .await
            .first_ready(now, limits)
            .map(|w| w.id)
        else {
            return Ok(Distribution::NoReadyWorker);
        };

        let from_queue = self.favor_queue.fetch_xor(true, Ordering::Relaxed);

        let pending = self.restarts().lock().await.pop();
        if let Some(restart) = pending {
            return self.dispatch_restart(worker_id, restart).await;
        }

        if from_queue {
            self.dispatch_from_queue(worker_id).await
        } else {
            self.dispatch_from_store(worker_id).await
        }
    }

    async fn dispatch_restart(
        &self,
        worker_id: WorkerId,
        mut restart: PendingRestart,
    ) -> AppResult<Distribution> {
        let previous = restart.job.job_id;
        if let Err(e) = self.repos().jobs.delete(previous).await {
            self.restarts().lock().await.requeue(restart);
            return Err(e);
        }

        let job = &restart.job;
        match self
            .start_job(worker_id, job.job_type, job.args.clone(), job.email.clone())
            .await
        {
            Ok(started) => {
                info!(previous = %previous, job_id = %started.job_id, "Restarted job");
                Ok(Distribution::Restarted {
                    previous,
                    job_id: started.job_id,
                })
            }
            Err(e) => {
                restart.failures += 1;
                if restart.failures < self.config().max_job_errors {
                    debug!(job_id = %previous, failures = restart.failures, error = %e, "Restart failed, will retry");
                    self.restarts().lock().await.requeue(restart);
                    Ok(Distribution::Retried)
                } else {
                    warn!(job_id = %previous, failures = restart.failures, "Restart failed too often, discarding job");
                    Ok(Distribution::Dropped)
                }
            }
        }
    }

    async fn dispatch_from_queue(&self, worker_id: WorkerId) -> AppResult<Distribution> {
        let Some(message) = self.queue().receive().await? else {
            return Ok(Distribution::Idle);
        };

        let request = match QueueRequest::parse(&message.content) {
            Ok(request) => request,
            Err(e) => {
                warn!(content = %message.content, error = %e, "Discarding malformed queue message");
                self.queue().delete(&message).await?;
                return Ok(Distribution::Dropped);
            }
        };
        let args = match request.job_args() {
            Ok(args) => args,
            Err(e) => {
                warn!(content = %message.content, error = %e, "Discarding unusable run request");
                self.queue().delete(&message).await?;
                return Ok(Distribution::Dropped);
            }
        };

        let outcome = match self
            .start_job(worker_id, request.job_type(), args, None)
            .await
        {
            Ok(job) => Distribution::Dispatched {
                job_id: job.job_id,
                job_type: job.job_type,
            },
            Err(e) => {
                let error_count = request.error_count() + 1;
                if error_count < self.config().max_job_errors {
                    debug!(request = %request, error_count, error = %e, "Queue dispatch failed, re-enqueueing");
                    self.queue()
                        .send(&request.with_error_count(error_count).to_string())
                        .await?;
                    Distribution::Retried
                } else {
                    warn!(request = %request, error_count, "Queue request failed too often, dropping");
                    Distribution::Dropped
                }
            }
        };

        self.queue().delete(&message).await?;
        Ok(outcome)
    }

    async fn dispatch_from_store(&self, worker_id: WorkerId) -> AppResult<Distribution> {
        let now = timestamp::now();
        let cool_down = self.config().cool_down_time();
        let requests = self.repos().continuous.list().await?;
        let live = self.live_run_ids().await?;

        let Some(mut request) = requests
            .into_iter()
            .find(|r| !r.in_cooldown(now, cool_down) && !live.contains(r.run_id.as_str()))
        else {
            return Ok(Distribution::Idle);
        };

        let previous_run = request.last_run;
        request.last_run = Some(now);
        self.repos().continuous.save(&request).await?;

        let args = match request.job_args() {
            Ok(args) => args,
            Err(e) => {
                warn!(run_id = %request.run_id, error = %e, "Continuous request is unusable");
                return self.record_continuous_failure(request, previous_run).await;
            }
        };

        match self
            .start_job(worker_id, JobType::Continuous, args, request.notify_target())
            .await
        {
            Ok(job) => Ok(Distribution::Dispatched {
                job_id: job.job_id,
                job_type: job.job_type,
            }),
            Err(e) => {
                debug!(run_id = %request.run_id, error = %e, "Continuous dispatch failed");
                self.record_continuous_failure(request, previous_run).await
            }
        }
    }

    /// Count a failed continuous dispatch. The cooldown timer is rolled
    /// back while the request still has error budget left.
    async fn record_continuous_failure(
        &self,
        mut request: ContinuousRunRequest,
        previous_run: Option<Timestamp>,
    ) -> AppResult<Distribution> {
        request.error_count += 1;
        let retry = request.error_count < self.config().max_job_errors;
        if retry {
            request.last_run = previous_run;
        } else {
            warn!(
                run_id = %request.run_id,
                error_count = request.error_count,
                "Continuous request keeps failing, waiting out the cooldown"
            );
        }
        self.repos().continuous.save(&request).await?;
        Ok(if retry {
            Distribution::Retried
        } else {
            Distribution::Dropped
        })
    }

    /// Request ids with a job running or about to be restarted anywhere.
    async fn live_run_ids(&self) -> AppResult<HashSet<String>> {
        let mut live: HashSet<String> = self
            .registry()
            .lock()
            .await
            .live_run_ids()
            .into_iter()
            .collect();
        live.extend(self.restarts().lock().await.live_run_ids());
        live.extend(
            self.repos()
                .jobs
                .list()
                .await?
                .iter()
                .filter_map(|job| job.run_id().map(str::to_string)),
        );
        Ok(live)
    }
}

//! Client-facing operations: submitting searches and reading results.
//!
//! These only touch the queue and the store. Dispatch happens in the
//! distribution loop of whichever controller picks the work up.

use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use deskwatch_core::config::ControllerConfig;
use deskwatch_core::error::AppError;
use deskwatch_core::result::AppResult;
use deskwatch_core::traits::queue::MessageQueue;
use deskwatch_core::types::timestamp;
use deskwatch_entity::continuous::ContinuousRunRequest;
use deskwatch_entity::desks::DesksCache;
use deskwatch_entity::months::months_between;
use deskwatch_entity::request::{QueueRequest, RunRequest};
use deskwatch_entity::result::ResultRecord;
use deskwatch_store::{QueueManager, Repositories};

/// Answer to a desk-list read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesksLookup {
    /// A cached list younger than the TTL.
    Fresh(DesksCache),
    /// No valid list; a desk check has been enqueued.
    Requested,
}

/// Submits work and reads results on behalf of clients.
#[derive(Debug, Clone)]
pub struct IntakeService {
    repos: Repositories,
    queue: QueueManager,
    desks_ttl: chrono::Duration,
}

impl IntakeService {
    pub fn new(repos: Repositories, queue: QueueManager, config: &ControllerConfig) -> Self {
        Self {
            repos,
            queue,
            desks_ttl: config.desks_ttl(),
        }
    }

    /// Enqueue a one-shot search. Returns the run id to poll with.
    pub async fn submit_run_once(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        desks: &[String],
    ) -> AppResult<String> {
        let desks = normalize_desks(desks)?;
        months_between(start_date, end_date)?;

        let run_id = Uuid::new_v4().to_string();
        let request = QueueRequest::RunOnce(RunRequest {
            run_id: run_id.clone(),
            start_date,
            end_date,
            desks,
            error_count: 0,
        });
        self.queue.send(&request.to_string()).await?;
        info!(run_id = %run_id, "Run-once request queued");
        Ok(run_id)
    }

    /// Store a standing search that runs until it finds something.
    pub async fn submit_continuous(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        desks: &[String],
        email: Option<String>,
    ) -> AppResult<String> {
        let desks = normalize_desks(desks)?;
        months_between(start_date, end_date)?;

        let run_id = Uuid::new_v4().to_string();
        let request = ContinuousRunRequest::new(run_id.clone(), start_date, end_date, &desks, email);
        self.repos.continuous.create(&request).await?;
        info!(run_id = %run_id, notify = request.notify_target().is_some(), "Continuous request stored");
        Ok(run_id)
    }

    /// Read the cached desk list. An expired row is deleted; when no valid
    /// row exists a desk check is enqueued.
    pub async fn read_desks(&self) -> AppResult<DesksLookup> {
        if let Some(cache) = self.repos.desks.get().await? {
            if cache.is_fresh(timestamp::now(), self.desks_ttl) {
                return Ok(DesksLookup::Fresh(cache));
            }
            debug!(checked_at = %timestamp::format(&cache.checked_at), "Desk list expired");
            self.repos.desks.delete().await?;
        }
        self.queue
            .send(&QueueRequest::CheckDesks { error_count: 0 }.to_string())
            .await?;
        info!("Desk check requested");
        Ok(DesksLookup::Requested)
    }

    /// Read the desk list, waiting up to `timeout` for a requested check to
    /// land. Returns `None` if it did not arrive in time.
    pub async fn get_desks(&self, timeout: Duration, poll: Duration) -> AppResult<Option<DesksCache>> {
        match self.read_desks().await? {
            DesksLookup::Fresh(cache) => Ok(Some(cache)),
            DesksLookup::Requested => self.wait_for_desks(timeout, poll).await,
        }
    }

    /// Poll the store until a fresh desk list appears or `timeout` passes.
    pub async fn wait_for_desks(&self, timeout: Duration, poll: Duration) -> AppResult<Option<DesksCache>> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(cache) = self.repos.desks.get().await? {
                if cache.is_fresh(timestamp::now(), self.desks_ttl) {
                    return Ok(Some(cache));
                }
            }
            if tokio::time::Instant::now() + poll > deadline {
                return Ok(None);
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Result of a finished run, if any.
    pub async fn get_result(&self, run_id: &str) -> AppResult<Option<ResultRecord>> {
        self.repos.results.find(run_id.trim()).await
    }
}

/// Lowercase desk names and reject ones the wire format cannot carry.
fn normalize_desks(desks: &[String]) -> AppResult<Vec<String>> {
    let mut normalized = Vec::with_capacity(desks.len());
    for desk in desks {
        let desk = desk.trim().to_lowercase();
        if desk.is_empty() {
            continue;
        }
        if desk.contains(',') || desk.contains('+') {
            return Err(AppError::validation(format!(
                "Desk name '{desk}' may not contain ',' or '+'"
            )));
        }
        normalized.push(desk);
    }
    if normalized.is_empty() {
        return Err(AppError::validation("At least one desk is required"));
    }
    Ok(normalized)
}

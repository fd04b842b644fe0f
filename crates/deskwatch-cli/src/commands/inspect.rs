//! Listing store contents.

use serde::Serialize;
use tabled::Tabled;

use deskwatch_core::error::AppError;
use deskwatch_core::types::timestamp;

use super::Context;
use crate::output;

#[derive(Debug, Serialize, Tabled)]
struct WorkerRow {
    id: String,
    address: String,
    last_heartbeat: String,
    stale: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct JobRow {
    id: String,
    #[tabled(rename = "type")]
    job_type: String,
    worker: String,
    run_id: String,
    controller: String,
    started: String,
}

#[derive(Debug, Serialize, Tabled)]
struct RequestRow {
    run_id: String,
    dates: String,
    desks: String,
    email: String,
    last_run: String,
    errors: u32,
}

pub async fn workers(ctx: &Context) -> Result<(), AppError> {
    let now = timestamp::now();
    let threshold = ctx.config.controller.orphan_threshold();
    let rows: Vec<WorkerRow> = ctx
        .repos
        .workers
        .list()
        .await?
        .into_iter()
        .map(|w| WorkerRow {
            id: w.worker_id.to_string(),
            stale: w.is_stale(now, threshold),
            address: w.address,
            last_heartbeat: timestamp::format(&w.last_heartbeat),
        })
        .collect();
    output::print_list(&rows, ctx.format);
    Ok(())
}

pub async fn jobs(ctx: &Context) -> Result<(), AppError> {
    let rows: Vec<JobRow> = ctx
        .repos
        .jobs
        .list()
        .await?
        .into_iter()
        .map(|j| JobRow {
            id: j.job_id.to_string(),
            job_type: j.job_type.to_string(),
            worker: j.assigned_worker.to_string(),
            run_id: j.run_id().unwrap_or("-").to_string(),
            controller: j.controller.unwrap_or_else(|| "-".to_string()),
            started: timestamp::format(&j.started),
        })
        .collect();
    output::print_list(&rows, ctx.format);
    Ok(())
}

pub async fn requests(ctx: &Context) -> Result<(), AppError> {
    let rows: Vec<RequestRow> = ctx
        .repos
        .continuous
        .list()
        .await?
        .into_iter()
        .map(|r| RequestRow {
            dates: format!(
                "{} - {}",
                r.start_date.format("%d/%m/%Y"),
                r.end_date.format("%d/%m/%Y")
            ),
            email: r.notify_target().unwrap_or_else(|| "-".to_string()),
            last_run: r
                .last_run
                .as_ref()
                .map(timestamp::format)
                .unwrap_or_else(|| "never".to_string()),
            errors: r.error_count,
            desks: r.desks,
            run_id: r.run_id,
        })
        .collect();
    output::print_list(&rows, ctx.format);
    Ok(())
}

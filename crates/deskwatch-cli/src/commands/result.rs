//! Reading run results.

use std::time::Duration;

use clap::Args;
use serde::Serialize;

use deskwatch_core::error::AppError;
use deskwatch_core::types::timestamp;

use super::{Context, seconds_arg};
use crate::output;

#[derive(Debug, Args)]
pub struct ResultArgs {
    /// Run id printed by `submit` or `subscribe`
    pub run_id: String,
    /// Keep polling for this many seconds
    #[arg(long, value_parser = seconds_arg, default_value = "0")]
    pub wait: Duration,
}

#[derive(Debug, Serialize)]
struct ResultView {
    run_id: String,
    stored_at: String,
    slots: Vec<String>,
}

pub async fn execute(ctx: &Context, args: &ResultArgs) -> Result<(), AppError> {
    let deadline = tokio::time::Instant::now() + args.wait;
    loop {
        if let Some(result) = ctx.intake.get_result(&args.run_id).await? {
            let view = ResultView {
                run_id: result.run_id,
                stored_at: timestamp::format(&result.stored_at),
                slots: result
                    .result
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            };
            output::print_item(&view, ctx.format);
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(AppError::not_found(format!(
                "No result for run {} yet",
                args.run_id
            )));
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

//! Synthetic load.

use chrono::NaiveDate;
use clap::Args;
use uuid::Uuid;

use deskwatch_core::error::AppError;
use deskwatch_core::traits::queue::MessageQueue;

use super::{Context, date_arg};
use crate::output;

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Number of run requests to enqueue
    #[arg(long, default_value_t = 40)]
    pub count: usize,
    #[arg(long, value_parser = date_arg, default_value = "23/03/2022")]
    pub start: NaiveDate,
    #[arg(long, value_parser = date_arg, default_value = "23/06/2022")]
    pub end: NaiveDate,
    /// `+`-joined desks
    #[arg(long, default_value = "IND Amsterdam+IND Den Haag")]
    pub desks: String,
}

/// Enqueue raw run requests, in the legacy form with `none` as the error
/// count.
pub async fn execute(ctx: &Context, args: &LoadArgs) -> Result<(), AppError> {
    for _ in 0..args.count {
        let message = format!(
            "{},{},{},{},none",
            Uuid::new_v4(),
            args.start.format("%d/%m/%Y"),
            args.end.format("%d/%m/%Y"),
            args.desks
        );
        ctx.backends.queue.send(&message).await?;
    }
    output::print_success(&format!("Enqueued {} run requests", args.count));
    Ok(())
}

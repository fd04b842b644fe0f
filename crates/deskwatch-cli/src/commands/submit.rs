//! Submitting searches.

use chrono::NaiveDate;
use clap::Args;

use deskwatch_core::error::AppError;

use super::{Context, date_arg};
use crate::output;

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// First day to search, DD/MM/YYYY
    #[arg(long, value_parser = date_arg)]
    pub start: NaiveDate,
    /// Last day to search, DD/MM/YYYY
    #[arg(long, value_parser = date_arg)]
    pub end: NaiveDate,
    /// Desk to search; repeat for several
    #[arg(long = "desk", required = true)]
    pub desks: Vec<String>,
}

#[derive(Debug, Args)]
pub struct SubscribeArgs {
    #[command(flatten)]
    pub search: SubmitArgs,
    /// Where to mail the slots once found
    #[arg(long)]
    pub email: Option<String>,
}

pub async fn submit(ctx: &Context, args: &SubmitArgs) -> Result<(), AppError> {
    let run_id = ctx
        .intake
        .submit_run_once(args.start, args.end, &args.desks)
        .await?;
    output::print_success(&format!("Queued run {run_id}"));
    Ok(())
}

pub async fn subscribe(ctx: &Context, args: &SubscribeArgs) -> Result<(), AppError> {
    let run_id = ctx
        .intake
        .submit_continuous(
            args.search.start,
            args.search.end,
            &args.search.desks,
            args.email.clone(),
        )
        .await?;
    output::print_success(&format!("Stored standing search {run_id}"));
    Ok(())
}

//! Reading the desk list.

use std::time::Duration;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use deskwatch_core::error::AppError;
use deskwatch_core::types::timestamp;

use super::{Context, seconds_arg};
use crate::output;

#[derive(Debug, Args)]
pub struct DesksArgs {
    /// How long to wait for a requested refresh
    #[arg(long, value_parser = seconds_arg, default_value = "120")]
    pub wait: Duration,
}

#[derive(Debug, Serialize, Tabled)]
struct DeskRow {
    desk: String,
    checked_at: String,
}

pub async fn execute(ctx: &Context, args: &DesksArgs) -> Result<(), AppError> {
    let Some(cache) = ctx
        .intake
        .get_desks(args.wait, Duration::from_secs(1))
        .await?
    else {
        return Err(AppError::service_unavailable(
            "Desk list not available yet; is a worker running?",
        ));
    };

    let checked_at = timestamp::format(&cache.checked_at);
    let rows: Vec<DeskRow> = cache
        .desk_names()
        .into_iter()
        .map(|desk| DeskRow {
            desk,
            checked_at: checked_at.clone(),
        })
        .collect();
    output::print_list(&rows, ctx.format);
    Ok(())
}

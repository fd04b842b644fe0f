//! CLI command definitions and dispatch.

pub mod desks;
pub mod inspect;
pub mod load;
pub mod migrate;
pub mod result;
pub mod submit;

use std::time::Duration;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use deskwatch_controller::IntakeService;
use deskwatch_core::config::AppConfig;
use deskwatch_core::error::AppError;
use deskwatch_store::{Backends, Repositories};

use crate::output::{self, OutputFormat};

/// Deskwatch: distributed appointment-slot checks
#[derive(Debug, Parser)]
#[command(name = "deskwatch", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default")]
    pub config: String,

    /// Environment overlay loaded from `config/<env>`
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Queue a one-shot search
    Submit(submit::SubmitArgs),
    /// Store a standing search that repeats until it finds a slot
    Subscribe(submit::SubscribeArgs),
    /// Show the result of a run
    Result(result::ResultArgs),
    /// Show the desk list, requesting a refresh if it is stale
    Desks(desks::DesksArgs),
    /// List registered workers
    Workers,
    /// List running jobs
    Jobs,
    /// List standing searches
    Requests,
    /// Flood the run queue with synthetic searches
    Load(load::LoadArgs),
    /// Apply database migrations
    Migrate,
}

impl Cli {
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = AppConfig::load(&self.config, &self.env)?;
        tracing::debug!(command = ?self.command, store = %config.store.provider, "Executing command");
        if let Commands::Migrate = self.command {
            return migrate::execute(&config).await;
        }

        if config.store.provider == "memory" || config.queue.provider == "memory" {
            output::print_warning(
                "In-memory backends are private to this process; point the CLI at the controller's store",
            );
        }
        let backends = Backends::connect(&config.store, &config.queue).await?;
        let ctx = Context {
            repos: Repositories::new(backends.store.clone()),
            intake: IntakeService::new(
                Repositories::new(backends.store.clone()),
                backends.queue.clone(),
                &config.controller,
            ),
            backends: backends.clone(),
            config,
            format: self.format,
        };

        let outcome = match &self.command {
            Commands::Submit(args) => submit::submit(&ctx, args).await,
            Commands::Subscribe(args) => submit::subscribe(&ctx, args).await,
            Commands::Result(args) => result::execute(&ctx, args).await,
            Commands::Desks(args) => desks::execute(&ctx, args).await,
            Commands::Workers => inspect::workers(&ctx).await,
            Commands::Jobs => inspect::jobs(&ctx).await,
            Commands::Requests => inspect::requests(&ctx).await,
            Commands::Load(args) => load::execute(&ctx, args).await,
            Commands::Migrate => Ok(()),
        };
        backends.close().await;
        outcome
    }
}

/// Everything a command needs.
pub struct Context {
    pub config: AppConfig,
    pub backends: Backends,
    pub repos: Repositories,
    pub intake: IntakeService,
    pub format: OutputFormat,
}

/// `DD/MM/YYYY` argument.
pub fn date_arg(s: &str) -> Result<NaiveDate, String> {
    deskwatch_entity::request::parse_date(s).map_err(|e| e.to_string())
}

/// Seconds argument as a `Duration`.
pub fn seconds_arg(s: &str) -> Result<Duration, String> {
    s.parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| format!("invalid number of seconds: {e}"))
}

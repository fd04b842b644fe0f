//! Database migration command.

use deskwatch_core::config::AppConfig;
use deskwatch_core::error::AppError;
use deskwatch_store::postgres::{DatabasePool, run_migrations};

use crate::output;

pub async fn execute(config: &AppConfig) -> Result<(), AppError> {
    if config.store.provider != "postgres" && config.queue.provider != "postgres" {
        output::print_warning("Neither the store nor the queue uses PostgreSQL; nothing to migrate.");
        return Ok(());
    }

    let pool = DatabasePool::connect(&config.store.postgres).await?;
    println!("Running database migrations...");
    run_migrations(pool.pool()).await?;
    pool.close().await;
    output::print_success("All migrations applied successfully.");
    Ok(())
}

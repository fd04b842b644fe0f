//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! a TOML file, an environment-specific overlay and `DESKWATCH__`-prefixed
//! environment variables. Each sub-module represents a logical section.

pub mod controller;
pub mod logging;
pub mod notification;
pub mod queue;
pub mod server;
pub mod store;

use serde::{Deserialize, Serialize};

pub use self::controller::ControllerConfig;
pub use self::logging::LoggingConfig;
pub use self::notification::NotificationConfig;
pub use self::queue::QueueConfig;
pub use self::server::ServerConfig;
pub use self::store::{PostgresConfig, RedisConfig, StoreConfig};

use crate::error::AppError;

/// Root application configuration.
///
/// Every section has defaults, so an empty file yields a runnable
/// single-node controller on the in-memory backends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Orchestration timings and budgets.
    #[serde(default)]
    pub controller: ControllerConfig,
    /// Table store backend.
    #[serde(default)]
    pub store: StoreConfig,
    /// Run-request queue backend.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Result notification delivery.
    #[serde(default)]
    pub notification: NotificationConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Merges the file at `path` with `config/{env}` and environment
    /// variables prefixed with `DESKWATCH__` (e.g.
    /// `DESKWATCH__CONTROLLER__JOB_TIMEOUT_SECONDS=600`).
    pub fn load(path: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("DESKWATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject combinations the orchestration loops cannot work with.
    pub fn validate(&self) -> Result<(), AppError> {
        let c = &self.controller;
        if c.max_number_of_jobs == 0 {
            return Err(AppError::configuration(
                "controller.max_number_of_jobs must be at least 1",
            ));
        }
        if c.max_job_errors == 0 || c.max_worker_errors == 0 {
            return Err(AppError::configuration(
                "controller error budgets must be at least 1",
            ));
        }
        if c.worker_timeout_seconds < c.heartbeat_time_seconds {
            return Err(AppError::configuration(
                "controller.worker_timeout_seconds must not be shorter than heartbeat_time_seconds",
            ));
        }
        Ok(())
    }
}

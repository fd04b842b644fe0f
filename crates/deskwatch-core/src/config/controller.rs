//! Orchestration engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timings, capacities and error budgets for the controller loops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Minutes between two dispatches of the same continuous run request.
    #[serde(default = "default_cool_down_time")]
    pub cool_down_time_minutes: u64,
    /// Seconds of heartbeat staleness before a worker is pinged.
    #[serde(default = "default_heartbeat_time")]
    pub heartbeat_time_seconds: u64,
    /// Seconds without a successful heartbeat before a worker is dropped.
    #[serde(default = "default_worker_timeout")]
    pub worker_timeout_seconds: u64,
    /// Seconds a job may run before it is reclaimed and restarted.
    #[serde(default = "default_job_timeout")]
    pub job_timeout_seconds: u64,
    /// Maximum number of jobs held by one worker.
    #[serde(default = "default_max_number_of_jobs")]
    pub max_number_of_jobs: usize,
    /// Minimum seconds between two job assignments to the same worker.
    #[serde(default = "default_worker_cooldown")]
    pub worker_cooldown_seconds: u64,
    /// Dispatch failures tolerated per request before it is dropped.
    #[serde(default = "default_max_errors")]
    pub max_job_errors: u32,
    /// Timeouts/failures tolerated per worker before it is shut down.
    #[serde(default = "default_max_errors")]
    pub max_worker_errors: u32,
    /// Tick of the heartbeat loop.
    #[serde(default = "default_ten")]
    pub heartbeat_check_interval_seconds: u64,
    /// Per-call timeout for heartbeat requests.
    #[serde(default = "default_heartbeat_request_timeout")]
    pub heartbeat_request_timeout_seconds: u64,
    /// Per-call timeout for start_job, adopt and shutdown requests.
    #[serde(default = "default_ten")]
    pub worker_request_timeout_seconds: u64,
    /// Tick of the worker-sync loop.
    #[serde(default = "default_ten")]
    pub sync_interval_seconds: u64,
    /// Tick of the job-distribution loop.
    #[serde(default = "default_distribution_interval")]
    pub distribution_interval_millis: u64,
    /// Tick of the job-health loop.
    #[serde(default = "default_ten")]
    pub job_check_interval_seconds: u64,
    /// Port workers listen on when they register without an explicit address.
    #[serde(default = "default_worker_port")]
    pub worker_port: u16,
    /// Minutes a cached desk list stays valid.
    #[serde(default = "default_desks_ttl")]
    pub desks_ttl_minutes: u64,
    /// Hours a stored result is retained (0 keeps results forever).
    #[serde(default = "default_result_retention")]
    pub result_retention_hours: u64,
    /// Tick of the result retention sweep.
    #[serde(default = "default_result_sweep_interval")]
    pub result_sweep_interval_seconds: u64,
    /// Send `shutdown` to owned workers when the controller exits.
    #[serde(default = "default_true")]
    pub shutdown_workers_on_exit: bool,
}

impl ControllerConfig {
    /// Continuous-run cooldown.
    pub fn cool_down_time(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.cool_down_time_minutes as i64)
    }

    /// Heartbeat staleness threshold.
    pub fn heartbeat_time(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.heartbeat_time_seconds as i64)
    }

    /// Worker liveness budget.
    pub fn worker_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.worker_timeout_seconds as i64)
    }

    /// Staleness after which a peer's worker is treated as orphaned.
    pub fn orphan_threshold(&self) -> chrono::Duration {
        self.heartbeat_time() + self.worker_timeout()
    }

    /// Job age limit for own jobs.
    pub fn job_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.job_timeout_seconds as i64)
    }

    /// Job age limit for jobs of other controllers.
    pub fn foreign_job_timeout(&self) -> chrono::Duration {
        self.job_timeout() * 2
    }

    /// Minimum gap between two assignments to one worker.
    pub fn worker_cooldown(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.worker_cooldown_seconds as i64)
    }

    /// Validity of the cached desk list.
    pub fn desks_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.desks_ttl_minutes as i64)
    }

    /// Result retention window, `None` when disabled.
    pub fn result_retention(&self) -> Option<chrono::Duration> {
        (self.result_retention_hours > 0)
            .then(|| chrono::Duration::hours(self.result_retention_hours as i64))
    }

    /// Heartbeat loop tick.
    pub fn heartbeat_check_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_check_interval_seconds)
    }

    /// Heartbeat request timeout.
    pub fn heartbeat_request_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_request_timeout_seconds)
    }

    /// Timeout for the other worker calls.
    pub fn worker_request_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_request_timeout_seconds)
    }

    /// Sync loop tick.
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_seconds)
    }

    /// Distribution loop tick.
    pub fn distribution_interval(&self) -> Duration {
        Duration::from_millis(self.distribution_interval_millis)
    }

    /// Health loop tick.
    pub fn job_check_interval(&self) -> Duration {
        Duration::from_secs(self.job_check_interval_seconds)
    }

    /// Retention sweep tick.
    pub fn result_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.result_sweep_interval_seconds)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            cool_down_time_minutes: default_cool_down_time(),
            heartbeat_time_seconds: default_heartbeat_time(),
            worker_timeout_seconds: default_worker_timeout(),
            job_timeout_seconds: default_job_timeout(),
            max_number_of_jobs: default_max_number_of_jobs(),
            worker_cooldown_seconds: default_worker_cooldown(),
            max_job_errors: default_max_errors(),
            max_worker_errors: default_max_errors(),
            heartbeat_check_interval_seconds: default_ten(),
            heartbeat_request_timeout_seconds: default_heartbeat_request_timeout(),
            worker_request_timeout_seconds: default_ten(),
            sync_interval_seconds: default_ten(),
            distribution_interval_millis: default_distribution_interval(),
            job_check_interval_seconds: default_ten(),
            worker_port: default_worker_port(),
            desks_ttl_minutes: default_desks_ttl(),
            result_retention_hours: default_result_retention(),
            result_sweep_interval_seconds: default_result_sweep_interval(),
            shutdown_workers_on_exit: default_true(),
        }
    }
}

fn default_cool_down_time() -> u64 {
    5
}

fn default_heartbeat_time() -> u64 {
    30
}

fn default_worker_timeout() -> u64 {
    90
}

fn default_job_timeout() -> u64 {
    300
}

fn default_max_number_of_jobs() -> usize {
    20
}

fn default_worker_cooldown() -> u64 {
    3
}

fn default_max_errors() -> u32 {
    3
}

fn default_ten() -> u64 {
    10
}

fn default_heartbeat_request_timeout() -> u64 {
    3
}

fn default_distribution_interval() -> u64 {
    1000
}

fn default_worker_port() -> u16 {
    5003
}

fn default_desks_ttl() -> u64 {
    60
}

fn default_result_retention() -> u64 {
    168
}

fn default_result_sweep_interval() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

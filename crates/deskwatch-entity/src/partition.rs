//! Store partition names.

pub const REGISTERED_WORKERS: &str = "RegisteredWorkers";
pub const REGISTERED_JOBS: &str = "RegisteredJobs";
pub const CONTINUOUS_RUN: &str = "ContinuousRun";
pub const DESKS: &str = "Desks";
pub const RESULT: &str = "Result";

/// Row key of the singleton desks row.
pub const DESKS_ROW: &str = "0";

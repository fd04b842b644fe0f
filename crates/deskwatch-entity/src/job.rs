//! Registered job rows and the payload sent to workers.

use std::fmt;
use std::str::FromStr;

use deskwatch_core::types::timestamp::{self, Timestamp};
use deskwatch_core::types::{JobId, WorkerId};
use deskwatch_core::AppError;
use serde::{Deserialize, Serialize};

/// Kind of work a job performs, which decides how its result is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    /// One-shot search from the queue.
    RunOnce,
    /// Search backing a continuous run request.
    Continuous,
    /// Refresh of the desk list.
    GetDesks,
}

impl JobType {
    /// Return the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RunOnce => "run-once",
            Self::Continuous => "continuous",
            Self::GetDesks => "get-desks",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "run-once" => Ok(Self::RunOnce),
            "continuous" => Ok(Self::Continuous),
            "get-desks" => Ok(Self::GetDesks),
            other => Err(AppError::validation(format!("Unknown job type '{other}'"))),
        }
    }
}

/// Arguments a worker needs to run a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobArgs {
    /// Fetch the list of desks.
    CheckDesks { check_desks: bool },
    /// Search for free appointment slots.
    Search {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        run_id: Option<String>,
        desired_months: Vec<String>,
        desks: Vec<String>,
    },
}

impl JobArgs {
    /// Arguments of a desk check.
    pub fn check_desks() -> Self {
        Self::CheckDesks { check_desks: true }
    }

    /// Request id the result is stored under, if any.
    pub fn run_id(&self) -> Option<&str> {
        match self {
            Self::CheckDesks { .. } => None,
            Self::Search { run_id, .. } => run_id.as_deref(),
        }
    }
}

/// Body of `POST /start_job`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartJobPayload {
    pub job_id: JobId,
    #[serde(flatten)]
    pub args: JobArgs,
}

/// A job as persisted in the `RegisteredJobs` partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Job identifier (also the row key).
    pub job_id: JobId,
    #[serde(rename = "type")]
    pub job_type: JobType,
    /// Worker currently holding the job.
    pub assigned_worker: WorkerId,
    /// Address the owning controller advertises; informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    /// Where to send the result, if anywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub args: JobArgs,
    #[serde(with = "timestamp::required")]
    pub started: Timestamp,
}

impl JobRecord {
    /// Request id the job was dispatched for.
    pub fn run_id(&self) -> Option<&str> {
        self.args.run_id()
    }

    /// Payload to send to the worker.
    pub fn payload(&self) -> StartJobPayload {
        StartJobPayload {
            job_id: self.job_id,
            args: self.args.clone(),
        }
    }

    /// Whether the job has been running longer than `timeout`.
    pub fn is_timed_out(&self, now: Timestamp, timeout: chrono::Duration) -> bool {
        now - self.started > timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_payload_shape() {
        let payload = StartJobPayload {
            job_id: JobId::new(),
            args: JobArgs::Search {
                run_id: Some("abc-123".into()),
                desired_months: vec!["juni".into()],
                desks: vec!["ind amsterdam".into()],
            },
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["run_id"], "abc-123");
        assert_eq!(json["desired_months"][0], "juni");
        assert!(json.get("check_desks").is_none());
        assert_eq!(json["job_id"], payload.job_id.to_string());
    }

    #[test]
    fn test_check_desks_payload_round_trip() {
        let payload = StartJobPayload {
            job_id: JobId::new(),
            args: JobArgs::check_desks(),
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"check_desks\":true"));
        let back: StartJobPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
        assert!(back.args.run_id().is_none());
    }

    #[test]
    fn test_job_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&JobType::GetDesks).unwrap(),
            "\"get-desks\""
        );
        assert_eq!("run-once".parse::<JobType>().unwrap(), JobType::RunOnce);
        assert!("check-desks".parse::<JobType>().is_err());
    }
}

//! Run request wire formats.
//!
//! Queue messages are comma-separated:
//!
//! ```text
//! runId,startDate,endDate,desk1+desk2+...,errorCount
//! check_desks,errorCount
//! ```
//!
//! Dates are `DD/MM/YYYY`. Whitespace around fields is ignored.

use std::fmt;

use chrono::NaiveDate;
use deskwatch_core::{AppError, AppResult};

use crate::job::{JobArgs, JobType};
use crate::months::months_between;

/// Request date format.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

const CHECK_DESKS: &str = "check_desks";

/// A decoded queue message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueRequest {
    /// Refresh the desk list.
    CheckDesks { error_count: u32 },
    /// One-shot search.
    RunOnce(RunRequest),
}

/// A one-shot search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub run_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Lowercased desk names.
    pub desks: Vec<String>,
    pub error_count: u32,
}

impl QueueRequest {
    /// Decode a queue message body.
    pub fn parse(content: &str) -> AppResult<Self> {
        let fields: Vec<&str> = content.split(',').map(str::trim).collect();

        if fields.first() == Some(&CHECK_DESKS) {
            let error_count = if fields.len() > 1 {
                parse_error_count(fields[fields.len() - 1])
            } else {
                0
            };
            return Ok(Self::CheckDesks { error_count });
        }

        let [run_id, start, end, desks, error_count] = fields.as_slice() else {
            return Err(AppError::validation(format!(
                "Expected 5 fields in run request, got {}: '{content}'",
                fields.len()
            )));
        };
        if run_id.is_empty() {
            return Err(AppError::validation("Run request has an empty run id"));
        }
        let desks = parse_desks(desks);
        if desks.is_empty() {
            return Err(AppError::validation(format!(
                "Run request '{run_id}' names no desks"
            )));
        }

        Ok(Self::RunOnce(RunRequest {
            run_id: run_id.to_string(),
            start_date: parse_date(start)?,
            end_date: parse_date(end)?,
            desks,
            error_count: parse_error_count(error_count),
        }))
    }

    /// Consecutive dispatch failures carried by the message.
    pub fn error_count(&self) -> u32 {
        match self {
            Self::CheckDesks { error_count } => *error_count,
            Self::RunOnce(run) => run.error_count,
        }
    }

    /// Copy of the request with a different error count.
    pub fn with_error_count(&self, error_count: u32) -> Self {
        match self {
            Self::CheckDesks { .. } => Self::CheckDesks { error_count },
            Self::RunOnce(run) => Self::RunOnce(RunRequest {
                error_count,
                ..run.clone()
            }),
        }
    }

    /// Job type the request dispatches.
    pub fn job_type(&self) -> JobType {
        match self {
            Self::CheckDesks { .. } => JobType::GetDesks,
            Self::RunOnce(_) => JobType::RunOnce,
        }
    }

    /// Worker arguments for the request.
    pub fn job_args(&self) -> AppResult<JobArgs> {
        match self {
            Self::CheckDesks { .. } => Ok(JobArgs::check_desks()),
            Self::RunOnce(run) => run.job_args(),
        }
    }
}

impl fmt::Display for QueueRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CheckDesks { error_count } => write!(f, "{CHECK_DESKS},{error_count}"),
            Self::RunOnce(run) => write!(
                f,
                "{},{},{},{},{}",
                run.run_id,
                run.start_date.format(DATE_FORMAT),
                run.end_date.format(DATE_FORMAT),
                run.desks.join("+"),
                run.error_count
            ),
        }
    }
}

impl RunRequest {
    /// Worker arguments: the months spanned by the date range plus desks.
    pub fn job_args(&self) -> AppResult<JobArgs> {
        search_args(&self.run_id, self.start_date, self.end_date, self.desks.clone())
    }
}

/// Build search arguments for a request id and date range.
pub fn search_args(
    run_id: &str,
    start: NaiveDate,
    end: NaiveDate,
    desks: Vec<String>,
) -> AppResult<JobArgs> {
    let desired_months = months_between(start, end)?
        .into_iter()
        .map(str::to_string)
        .collect();
    Ok(JobArgs::Search {
        run_id: Some(run_id.to_string()),
        desired_months,
        desks,
    })
}

/// Parse a `DD/MM/YYYY` date.
pub fn parse_date(s: &str) -> AppResult<NaiveDate> {
    Ok(NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)?)
}

/// Split a `+`-joined desk list into lowercased names.
pub fn parse_desks(s: &str) -> Vec<String> {
    s.split('+')
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .collect()
}

/// Notification target from its stored form; `none` and blank mean unset.
pub fn parse_email(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(s.to_string())
    }
}

/// Error count field; anything non-numeric (legacy `none`) counts as 0.
pub fn parse_error_count(s: &str) -> u32 {
    s.trim().parse().unwrap_or(0)
}

/// `#[serde(with = "...")]` helper for `DD/MM/YYYY` dates.
pub mod date_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&date.format(super::DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_date(&raw).map_err(serde::de::Error::custom)
    }
}

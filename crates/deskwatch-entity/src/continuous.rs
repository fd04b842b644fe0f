//! Continuous run requests.

use chrono::NaiveDate;
use deskwatch_core::types::timestamp::{self, Timestamp};
use deskwatch_core::AppResult;
use serde::{Deserialize, Deserializer, Serialize};

use crate::job::JobArgs;
use crate::request::{date_format, parse_desks, parse_email, search_args};

/// A standing search stored in the `ContinuousRun` partition.
///
/// Dispatched at most once per cooldown window until a run produces a
/// non-empty result, which deletes the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuousRunRequest {
    /// Request identifier (also the row key).
    pub run_id: String,
    #[serde(with = "date_format")]
    pub start_date: NaiveDate,
    #[serde(with = "date_format")]
    pub end_date: NaiveDate,
    /// `+`-joined desk names.
    pub desks: String,
    /// Notification target; stored as `none` when unset.
    #[serde(default = "none_email")]
    pub email: String,
    #[serde(with = "timestamp::optional", default)]
    pub last_run: Option<Timestamp>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub error_count: u32,
}

impl ContinuousRunRequest {
    /// A fresh request that has never run.
    pub fn new(
        run_id: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        desks: &[String],
        email: Option<String>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            start_date,
            end_date,
            desks: desks.join("+"),
            email: email.unwrap_or_else(none_email),
            last_run: None,
            error_count: 0,
        }
    }

    /// Whether the request ran less than `cool_down` ago.
    pub fn in_cooldown(&self, now: Timestamp, cool_down: chrono::Duration) -> bool {
        self.last_run
            .is_some_and(|last_run| now - last_run < cool_down)
    }

    /// Where to send a successful result.
    pub fn notify_target(&self) -> Option<String> {
        parse_email(&self.email)
    }

    /// Worker arguments for one run.
    pub fn job_args(&self) -> AppResult<JobArgs> {
        search_args(
            &self.run_id,
            self.start_date,
            self.end_date,
            parse_desks(&self.desks),
        )
    }
}

fn none_email() -> String {
    "none".to_string()
}

/// Accepts numbers and numeric strings; anything else is 0.
fn lenient_count<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_u64().map(|n| n.min(u32::MAX as u64) as u32).unwrap_or(0),
        serde_json::Value::String(s) => crate::request::parse_error_count(&s),
        _ => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ContinuousRunRequest {
        ContinuousRunRequest::new(
            "run-1",
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 7, 15).unwrap(),
            &["IND Den Haag".to_string()],
            None,
        )
    }

    #[test]
    fn test_never_run_is_not_cooling_down() {
        let now = timestamp::now();
        assert!(!request().in_cooldown(now, chrono::Duration::minutes(5)));
    }

    #[test]
    fn test_cooldown_window() {
        let mut req = request();
        let t = timestamp::parse("01/06/2024 12:00:00").unwrap();
        req.last_run = Some(t);
        let cd = chrono::Duration::minutes(5);
        assert!(req.in_cooldown(t + chrono::Duration::minutes(4), cd));
        assert!(!req.in_cooldown(t + chrono::Duration::minutes(5), cd));
    }

    #[test]
    fn test_stored_shape_and_lenient_count() {
        let json = serde_json::json!({
            "run_id": "run-1",
            "start_date": "01/06/2024",
            "end_date": "15/07/2024",
            "desks": "IND Den Haag",
            "email": "none",
            "last_run": "",
            "error_count": "none"
        });
        let req: ContinuousRunRequest = serde_json::from_value(json).unwrap();
        assert_eq!(req, request());
        assert!(req.notify_target().is_none());

        let out = serde_json::to_value(&req).unwrap();
        assert_eq!(out["start_date"], "01/06/2024");
        assert_eq!(out["last_run"], "");
        assert_eq!(out["error_count"], 0);
    }

    #[test]
    fn test_job_args_lowercase_desks() {
        let JobArgs::Search {
            desired_months,
            desks,
            ..
        } = request().job_args().unwrap()
        else {
            panic!("expected search args");
        };
        assert_eq!(desired_months, vec!["juni", "juli"]);
        assert_eq!(desks, vec!["ind den haag"]);
    }
}

//! Conversion of date ranges into the Dutch month names workers search.

use chrono::{Datelike, NaiveDate};
use deskwatch_core::{AppError, AppResult};

/// Dutch month names, January first.
pub const MONTHS: [&str; 12] = [
    "januari",
    "februari",
    "maart",
    "april",
    "mei",
    "juni",
    "juli",
    "augustus",
    "september",
    "oktober",
    "november",
    "december",
];

/// Months spanned by `start..=end`, in chronological order.
///
/// Ranges crossing a year boundary wrap around (november to februari);
/// a name appears at most once, so ranges of a year or longer yield all
/// twelve months.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> AppResult<Vec<&'static str>> {
    if end < start {
        return Err(AppError::validation(format!(
            "End date {end} is before start date {start}"
        )));
    }

    let mut months = Vec::new();
    let (mut year, mut month) = (start.year(), start.month0());
    while (year, month) <= (end.year(), end.month0()) && months.len() < MONTHS.len() {
        months.push(MONTHS[month as usize]);
        month += 1;
        if month == 12 {
            month = 0;
            year += 1;
        }
    }
    Ok(months)
}

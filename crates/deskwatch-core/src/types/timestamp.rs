//! Persisted timestamp codec.
//!
//! Every timestamp written to the store uses `DD/MM/YYYY HH:MM:SS` in UTC.
//! The serde helper modules let entity structs keep `DateTime<Utc>` fields
//! while the stored text stays in that format.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::AppError;

/// Timestamp type used across the workspace.
pub type Timestamp = DateTime<Utc>;

/// Storage format for timestamps.
pub const FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Current time truncated to whole seconds, matching the stored precision.
pub fn now() -> Timestamp {
    let now = Utc::now();
    DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now)
}

/// Render a timestamp in storage format.
pub fn format(ts: &Timestamp) -> String {
    ts.format(FORMAT).to_string()
}

/// Parse a timestamp in storage format.
pub fn parse(s: &str) -> Result<Timestamp, AppError> {
    let naive = NaiveDateTime::parse_from_str(s.trim(), FORMAT)?;
    Ok(naive.and_utc())
}

/// `#[serde(with = "...")]` helper for required timestamps.
pub mod required {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Timestamp;

    pub fn serialize<S: Serializer>(ts: &Timestamp, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Timestamp, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// `#[serde(with = "...")]` helper for optional timestamps.
///
/// `None` is stored as the empty string, and an empty string reads back
/// as `None`.
pub mod optional {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Timestamp;

    pub fn serialize<S: Serializer>(ts: &Option<Timestamp>, s: S) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => s.serialize_str(&super::format(ts)),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Timestamp>, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        if raw.trim().is_empty() {
            return Ok(None);
        }
        super::parse(&raw).map(Some).map_err(serde::de::Error::custom)
    }
}

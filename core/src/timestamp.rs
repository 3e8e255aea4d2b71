//! Calendar instant <-> epoch-millisecond conversion.
//!
//! RULE: Every instant leaving the pipeline is an integer epoch-millisecond
//! timestamp. Downstream point-in-time joins assume UTC, and a plain integer
//! cannot be reinterpreted in a local zone.

use crate::{
    error::{FeatureError, FeatureResult},
    types::EpochMillis,
};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde_json::Value;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Naive layouts found in raw transaction exports. Read as UTC.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Convert a calendar instant to epoch milliseconds.
pub fn date_to_timestamp(date: DateTime<Utc>) -> EpochMillis {
    date.timestamp_millis()
}

/// Convert epoch milliseconds back to a calendar instant.
pub fn timestamp_to_date(timestamp: EpochMillis) -> FeatureResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(timestamp).ok_or_else(|| {
        FeatureError::input(format!("timestamp {timestamp} ms is outside the representable range"))
    })
}

/// Express a signed duration in fractional days.
pub fn time_delta_to_days(delta: TimeDelta) -> f64 {
    let seconds = delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9;
    seconds / SECONDS_PER_DAY
}

/// Parse a `datetime` cell.
///
/// Accepts an integer (epoch milliseconds), an RFC 3339 string, or a naive
/// `YYYY-MM-DD HH:MM:SS[.fff]` string.
pub fn parse_datetime(value: &Value) -> Result<DateTime<Utc>, String> {
    match value {
        Value::Number(n) => {
            let millis = n
                .as_i64()
                .ok_or_else(|| format!("expected integer epoch milliseconds, got {n}"))?;
            DateTime::from_timestamp_millis(millis)
                .ok_or_else(|| format!("epoch milliseconds {millis} out of range"))
        }
        Value::String(s) => parse_datetime_str(s),
        other => Err(format!("expected timestamp or datetime string, got {other}")),
    }
}

fn parse_datetime_str(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("unrecognised datetime '{s}'"))
}

//! Timestamp utilities

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::SystemTime;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time as whole Unix seconds (download filename prefix)
pub fn unix_seconds() -> i64 {
    now().timestamp()
}

/// Format a UTC timestamp as RFC 3339 with second precision
pub fn to_rfc3339(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Format a filesystem timestamp as RFC 3339
pub fn system_time_to_rfc3339(time: SystemTime) -> String {
    to_rfc3339(DateTime::<Utc>::from(time))
}

/// Bytes to MiB, rounded to 2 decimals
pub fn bytes_to_mb(bytes: u64) -> f64 {
    round2(bytes as f64 / (1024.0 * 1024.0))
}

/// Round to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

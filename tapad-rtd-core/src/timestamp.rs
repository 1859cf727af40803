//! Stale/expiry boundary timestamps.
//!
//! The envelope service sends `staleAt` and `expiresAt` either as epoch
//! milliseconds or as RFC 3339 strings. They are persisted verbatim and only
//! interpreted when a cycle compares them against the clock.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Parse a persisted boundary timestamp.
///
/// Accepts integer or fractional epoch milliseconds and RFC 3339 date-times.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(millis) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis);
    }
    if let Ok(millis) = raw.parse::<f64>() {
        if millis.is_finite() {
            return DateTime::from_timestamp_millis(millis as i64);
        }
        return None;
    }

    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Text form of a boundary timestamp taken from a response body.
///
/// Numbers keep their JSON rendering and strings are kept as-is. Anything
/// else (null, objects, arrays) has no usable boundary.
pub fn timestamp_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Returns true when `now` is strictly after the boundary.
///
/// An absent boundary counts as the Unix epoch, so it has always passed. An
/// unparseable boundary is treated the same way.
pub fn has_passed(now: Timestamp, boundary: Option<&str>) -> bool {
    match boundary.and_then(parse_timestamp) {
        Some(at) => now > at,
        None => {
            if let Some(raw) = boundary {
                tracing::debug!(raw, "unparseable boundary timestamp, treating as passed");
            }
            now > DateTime::UNIX_EPOCH
        }
    }
}

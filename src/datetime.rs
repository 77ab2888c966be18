//! Parsing of date/time arguments given on the command line.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

/// Shown after a parse error so the user knows what we accept.
pub const FORMAT_HINT: &str =
    "Please use ISO format (e.g., 2024-01-15T10:00:00 or 2024-01-15T10:00:00-05:00)";

#[derive(Debug, Error, PartialEq)]
#[error("Invalid isoformat string: '{input}'")]
pub struct DateParseError {
    pub input: String,
}

const ZONED_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z"];
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse an ISO 8601 date or date-time.
///
/// An explicit offset (`Z`, `±HH`, `±HHMM` or `±HH:MM`) is kept as given; input without
/// one is taken as UTC. A bare date means midnight.
pub fn parse_iso_datetime(input: &str) -> Result<DateTime<FixedOffset>, DateParseError> {
    let err = || DateParseError {
        input: input.to_string(),
    };

    let trimmed = input.trim();
    if trimmed.len() < 10 {
        return Err(err());
    }

    // Accept a space between date and time, as well as `T`
    let mut normalized = trimmed.to_string();
    if normalized.as_bytes().get(10) == Some(&b' ') {
        normalized.replace_range(10..11, "T");
    }
    if let Some(stripped) = normalized.strip_suffix(['Z', 'z']) {
        normalized = format!("{stripped}+00:00");
    }
    let normalized = pad_hour_only(&normalized);

    for format in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, format) {
            return Ok(dt);
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Ok(dt.and_utc().fixed_offset());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc().fixed_offset());
    }

    Err(err())
}

/// Pad an hour-only time or offset (`T10`, `+05`) out to `HH:MM`.
fn pad_hour_only(input: &str) -> String {
    let Some((date, rest)) = input.split_once('T') else {
        return input.to_string();
    };
    let (time, offset) = match rest.find(['+', '-']) {
        Some(at) => rest.split_at(at),
        None => (rest, ""),
    };

    let mut padded = format!("{date}T{time}");
    if time.len() == 2 {
        padded.push_str(":00");
    }
    padded.push_str(offset);
    if offset.len() == 3 {
        padded.push_str(":00");
    }
    padded
}

/// The current instant, expressed in UTC.
pub fn now_utc() -> DateTime<FixedOffset> {
    Utc::now().fixed_offset()
}

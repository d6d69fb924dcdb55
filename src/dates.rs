//! Conversions between the store's timestamp format and the plain
//! space-separated format most callers keep.

use chrono::NaiveDateTime;

use crate::error::{Error, Result};

/// Timestamp format the store writes: `2024-05-01T17:30:00`.
const ELASTIC_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
/// Application-side format: `2024-05-01 17:30:00`.
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert a stored timestamp into the application format.
///
/// Stored values sometimes carry fractional seconds or a timezone offset;
/// both suffixes are truncated before parsing.
pub fn from_elastic_date(date: &str) -> Result<String> {
    let date = date.split_once('.').map_or(date, |(head, _)| head);
    let date = date.split_once('+').map_or(date, |(head, _)| head);

    let parsed = NaiveDateTime::parse_from_str(date, ELASTIC_DATE_FORMAT)
        .map_err(|e| Error::Validation(format!("invalid stored date {date}: {e}")))?;
    Ok(parsed.format(DATE_FORMAT).to_string())
}

/// Convert an application-format timestamp into the store's format.
pub fn to_elastic_date(date: &str) -> Result<String> {
    let parsed = NaiveDateTime::parse_from_str(date, DATE_FORMAT)
        .map_err(|e| Error::Validation(format!("invalid date {date}: {e}")))?;
    Ok(parsed.format(ELASTIC_DATE_FORMAT).to_string())
}

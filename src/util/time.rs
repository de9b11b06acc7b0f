//! Time and date parsing utilities.

use crate::error::{JiraMetricsError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};

/// Parse a timestamp as Jira writes it (`2024-01-15T10:30:00.000+0000`).
///
/// RFC 3339 is accepted as well. Returns `None` for anything else.
#[must_use]
pub fn parse_jira_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    None
}

/// Parse a date given on the command line.
///
/// Supports:
/// - RFC 3339 and Jira timestamps (offset honoured)
/// - `YYYY-MM-DD HH:MM[:SS]` and `YYYY-MM-DDTHH:MM[:SS]` (taken as UTC)
/// - `YYYY-MM-DD` (midnight UTC)
///
/// # Errors
///
/// Returns `InvalidDate` when no format matches.
pub fn parse_user_date(s: &str, field_name: &str) -> Result<DateTime<Utc>> {
    parse_user_date_with_offset(s, field_name).map(|dt| dt.with_timezone(&Utc))
}

/// Same formats as [`parse_user_date`], keeping the offset the user wrote.
///
/// # Errors
///
/// Returns `InvalidDate` when no format matches.
pub fn parse_user_date_with_offset(s: &str, field_name: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = s.trim();

    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt);
    }

    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc().fixed_offset());
    }

    Err(JiraMetricsError::invalid_date(field_name, s))
}

/// Parse an optional date argument, treating empty strings as absent.
///
/// # Errors
///
/// Returns `InvalidDate` when a non-empty value does not parse.
pub fn parse_optional_date(s: Option<&str>, field_name: &str) -> Result<Option<DateTime<Utc>>> {
    match s.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_user_date(value, field_name).map(Some),
    }
}

/// Render a timestamp as RFC 3339, printing fractional seconds only when present.
#[must_use]
pub fn to_iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    #[test]
    fn test_parse_jira_timestamp_with_millis() {
        let dt = parse_jira_timestamp("2024-03-05T14:30:00.000+0100").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 5, 13, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_jira_timestamp_rfc3339() {
        let dt = parse_jira_timestamp("2024-03-05T14:30:00Z").unwrap();
        assert_eq!(dt.hour(), 14);
    }

    #[test]
    fn test_parse_jira_timestamp_garbage() {
        assert!(parse_jira_timestamp("").is_none());
        assert!(parse_jira_timestamp("last tuesday").is_none());
    }

    #[test]
    fn test_parse_user_date_forms() {
        let date = parse_user_date("2024-06-20", "start").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2024, 6, 20));
        assert_eq!(date.hour(), 0);

        let with_time = parse_user_date("2024-06-20 08:15", "start").unwrap();
        assert_eq!((with_time.hour(), with_time.minute()), (8, 15));

        let offset = parse_user_date("2024-06-20T08:15:00+02:00", "start").unwrap();
        assert_eq!(offset.hour(), 6);
    }

    #[test]
    fn test_parse_user_date_invalid() {
        let err = parse_user_date("20/06/2024", "end").unwrap_err();
        assert!(matches!(err, JiraMetricsError::InvalidDate { .. }));
    }

    #[test]
    fn test_parse_optional_date_empty() {
        assert!(parse_optional_date(Some("  "), "end").unwrap().is_none());
        assert!(parse_optional_date(None, "end").unwrap().is_none());
    }

    #[test]
    fn test_to_iso_drops_zero_fraction() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
        assert_eq!(to_iso(&dt), "2024-01-02T10:00:00+00:00");
    }
}

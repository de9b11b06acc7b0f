//! Working-hours overlap between two instants.

use crate::error::{JiraMetricsError, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const DEFAULT_START: &str = "09:00";
const DEFAULT_END: &str = "17:00";
const DEFAULT_TIMEZONE: &str = "UTC";

/// Business-hours settings as stored in an export profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BusinessHours {
    #[serde(default = "default_start")]
    pub start: String,
    #[serde(default = "default_end")]
    pub end: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_true")]
    pub exclude_weekends: bool,
    #[serde(default)]
    pub holidays: Vec<String>,
}

fn default_start() -> String {
    DEFAULT_START.to_string()
}

fn default_end() -> String {
    DEFAULT_END.to_string()
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

const fn default_true() -> bool {
    true
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            start: default_start(),
            end: default_end(),
            timezone: default_timezone(),
            exclude_weekends: true,
            holidays: Vec::new(),
        }
    }
}

/// Parsed form of [`BusinessHours`], ready for overlap computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessWindow {
    pub tz: Tz,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub exclude_weekends: bool,
    pub holidays: HashSet<NaiveDate>,
}

impl BusinessHours {
    /// Validate and parse the settings.
    ///
    /// Empty strings fall back to the defaults. Holidays that are not
    /// `YYYY-MM-DD` are ignored.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown time zone or a malformed `HH:MM`.
    pub fn resolve(&self) -> Result<BusinessWindow> {
        let tz_name = non_empty_or(&self.timezone, DEFAULT_TIMEZONE);
        let tz: Tz = tz_name.parse().map_err(|_| {
            JiraMetricsError::validation(
                "business_hours.timezone",
                format!("unknown time zone '{tz_name}'"),
            )
        })?;

        let start = parse_hhmm(non_empty_or(&self.start, DEFAULT_START), "business_hours.start")?;
        let end = parse_hhmm(non_empty_or(&self.end, DEFAULT_END), "business_hours.end")?;

        let holidays = self
            .holidays
            .iter()
            .filter_map(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok())
            .collect();

        Ok(BusinessWindow {
            tz,
            start,
            end,
            exclude_weekends: self.exclude_weekends,
            holidays,
        })
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() { fallback } else { trimmed }
}

fn parse_hhmm(value: &str, field: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| JiraMetricsError::validation(field, format!("expected HH:MM, got '{value}'")))
}

impl BusinessWindow {
    fn is_working_day(&self, date: NaiveDate) -> bool {
        if self.exclude_weekends && matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        !self.holidays.contains(&date)
    }

    fn localize(&self, naive: NaiveDateTime) -> DateTime<Tz> {
        self.tz
            .from_local_datetime(&naive)
            .earliest()
            .unwrap_or_else(|| self.tz.from_utc_datetime(&naive))
    }

    /// Hours of `[start, end]` that fall inside the daily window on working days.
    #[must_use]
    pub fn overlap_hours(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
        if end <= start {
            return 0.0;
        }
        let local_start = start.with_timezone(&self.tz);
        let local_end = end.with_timezone(&self.tz);

        let mut total = Duration::zero();
        let mut day = local_start.date_naive();
        let last = local_end.date_naive();

        while day <= last {
            if self.is_working_day(day) {
                let day_start = self.localize(day.and_time(self.start));
                let day_end = self.localize(day.and_time(self.end));
                let seg_start = local_start.max(day_start);
                let seg_end = local_end.min(day_end);
                if seg_end > seg_start {
                    total += seg_end - seg_start;
                }
            }
            let Some(next) = day.succ_opt() else { break };
            day = next;
        }

        total.num_milliseconds() as f64 / 3_600_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_same_day_clipped_to_window() {
        let window = BusinessHours::default().resolve().unwrap();
        // Wednesday 2024-01-03, 08:00 -> 12:30 counts 09:00 -> 12:30
        let hours = window.overlap_hours(utc(2024, 1, 3, 8, 0), utc(2024, 1, 3, 12, 30));
        assert!((hours - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_weekend_skipped() {
        let window = BusinessHours::default().resolve().unwrap();
        // Friday 16:00 -> Monday 10:00 = 1h Friday + 1h Monday
        let hours = window.overlap_hours(utc(2024, 1, 5, 16, 0), utc(2024, 1, 8, 10, 0));
        assert!((hours - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_weekends_included_when_configured() {
        let window = BusinessHours {
            exclude_weekends: false,
            ..BusinessHours::default()
        }
        .resolve()
        .unwrap();
        let hours = window.overlap_hours(utc(2024, 1, 6, 0, 0), utc(2024, 1, 7, 23, 0));
        assert!((hours - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_holidays_skipped_and_bad_entries_ignored() {
        let window = BusinessHours {
            holidays: vec!["2024-01-03".into(), "not-a-date".into()],
            ..BusinessHours::default()
        }
        .resolve()
        .unwrap();
        assert_eq!(window.holidays.len(), 1);
        let hours = window.overlap_hours(utc(2024, 1, 3, 0, 0), utc(2024, 1, 4, 23, 0));
        assert!((hours - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_timezone_shifts_window() {
        let window = BusinessHours {
            timezone: "America/New_York".into(),
            ..BusinessHours::default()
        }
        .resolve()
        .unwrap();
        // 09:00-17:00 EST is 14:00-22:00 UTC in January
        let hours = window.overlap_hours(utc(2024, 1, 3, 12, 0), utc(2024, 1, 3, 15, 0));
        assert!((hours - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_reversed_interval_is_zero() {
        let window = BusinessHours::default().resolve().unwrap();
        assert!(window.overlap_hours(utc(2024, 1, 3, 12, 0), utc(2024, 1, 3, 10, 0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resolve_rejects_bad_input() {
        let bad_tz = BusinessHours {
            timezone: "Mars/Olympus".into(),
            ..BusinessHours::default()
        };
        assert!(bad_tz.resolve().is_err());

        let bad_time = BusinessHours {
            start: "9am".into(),
            ..BusinessHours::default()
        };
        assert!(bad_time.resolve().is_err());

        let empty = BusinessHours {
            start: String::new(),
            timezone: " ".into(),
            ..BusinessHours::default()
        };
        assert_eq!(empty.resolve().unwrap().start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }
}

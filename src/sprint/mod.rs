//! Sprint analysis: every status transition inside a sprint window, placed
//! relative to the sprint's days.

use crate::client::JiraApi;
use crate::error::{JiraMetricsError, Result};
use crate::format::csv::to_csv_string;
use crate::metrics::extract_status_changes;
use crate::model::Issue;
use crate::util::time::{
    parse_jira_timestamp, parse_user_date, parse_user_date_with_offset, to_iso,
};
use crate::util::{ProgressSink, atomic_write, fetch_all};
use chrono::{DateTime, NaiveTime, Timelike, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

const KEY_PAGE_SIZE: u64 = 100;

pub const HEADERS: [&str; 8] = [
    "issue_key",
    "from_status",
    "to_status",
    "transition_date",
    "sprint_day",
    "days_from_sprint_start",
    "days_to_sprint_end",
    "sprint_progress_percent",
];

/// Inclusive sprint bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SprintWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SprintWindow {
    /// # Errors
    ///
    /// Returns a validation error unless `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(JiraMetricsError::validation(
                "end",
                "Sprint start date must be before end date",
            ));
        }
        Ok(Self { start, end })
    }

    /// Whole days between start and end.
    #[must_use]
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SprintRow {
    pub issue_key: String,
    pub from_status: String,
    pub to_status: String,
    pub transition_date: Option<DateTime<Utc>>,
    pub sprint_day: i64,
    pub days_from_sprint_start: i64,
    pub days_to_sprint_end: i64,
    /// `None` when the sprint is shorter than a day or the row is an error.
    pub sprint_progress_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SprintRow {
    fn transition(key: &str, from: &str, to: &str, at: DateTime<Utc>, window: &SprintWindow) -> Self {
        let days_from_start = (at.date_naive() - window.start.date_naive()).num_days();
        let days_to_end = (window.end.date_naive() - at.date_naive()).num_days();
        let duration = window.duration_days();
        let progress = (duration > 0).then(|| {
            let percent = days_from_start as f64 / duration as f64 * 100.0;
            (percent * 10.0).round() / 10.0
        });
        Self {
            issue_key: key.to_string(),
            from_status: from.to_string(),
            to_status: to.to_string(),
            transition_date: Some(at),
            sprint_day: days_from_start + 1,
            days_from_sprint_start: days_from_start,
            days_to_sprint_end: days_to_end,
            sprint_progress_percent: progress,
            error: None,
        }
    }

    fn error(key: &str, error: &JiraMetricsError) -> Self {
        Self {
            issue_key: key.to_string(),
            from_status: "ERROR".to_string(),
            to_status: "ERROR".to_string(),
            transition_date: None,
            sprint_day: 0,
            days_from_sprint_start: 0,
            days_to_sprint_end: 0,
            sprint_progress_percent: None,
            error: Some(error.to_string()),
        }
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.issue_key.clone(),
            self.from_status.clone(),
            self.to_status.clone(),
            self.transition_date.as_ref().map(to_iso).unwrap_or_default(),
            self.sprint_day.to_string(),
            self.days_from_sprint_start.to_string(),
            self.days_to_sprint_end.to_string(),
            self.sprint_progress_percent
                .map_or_else(|| "0".to_string(), format_percent),
        ]
    }
}

fn format_percent(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') { text } else { format!("{text}.0") }
}

/// Result of a sprint analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SprintReport {
    pub window: SprintWindow,
    pub headers: Vec<String>,
    pub rows: Vec<SprintRow>,
}

impl SprintReport {
    fn new(window: SprintWindow, mut rows: Vec<SprintRow>, had_issues: bool) -> Self {
        rows.sort_by_key(|row| row.transition_date);
        let headers = if had_issues {
            HEADERS.iter().map(|h| (*h).to_string()).collect()
        } else {
            vec![HEADERS[0].to_string()]
        };
        Self {
            window,
            headers,
            rows,
        }
    }

    #[must_use]
    pub fn to_csv_string(&self) -> String {
        let rows: Vec<Vec<String>> = self.rows.iter().map(SprintRow::cells).collect();
        to_csv_string(&self.headers, &rows)
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        atomic_write(path, self.to_csv_string().as_bytes())
    }
}

fn rows_for(issue: &Issue, window: &SprintWindow) -> Vec<SprintRow> {
    extract_status_changes(issue)
        .into_iter()
        .filter(|change| window.contains(change.at))
        .map(|change| {
            SprintRow::transition(
                &issue.key,
                change.from.as_deref().unwrap_or_default(),
                change.to.as_deref().unwrap_or_default(),
                change.at,
                window,
            )
        })
        .collect()
}

/// Parse user-supplied sprint dates; a midnight end covers the whole day.
///
/// # Errors
///
/// Returns `InvalidDate` for unparsable dates or a validation error when
/// the start is not before the end.
pub fn parse_window(start: &str, end: &str) -> Result<SprintWindow> {
    let start = parse_user_date(start, "start")?;
    let mut end = parse_user_date_with_offset(end, "end")?;
    if end.time() == NaiveTime::MIN {
        end = end
            .with_hour(23)
            .and_then(|e| e.with_minute(59))
            .and_then(|e| e.with_second(59))
            .unwrap_or(end);
    }
    SprintWindow::new(start, end.with_timezone(&Utc))
}

/// Transitions within `[start, end]` for every issue matched by `jql`.
///
/// # Errors
///
/// Returns an error for invalid dates or a failed key search. Issues that
/// fail to download become `ERROR` rows.
pub fn analyze_sprint(
    api: &dyn JiraApi,
    jql: &str,
    start: &str,
    end: &str,
    workers: usize,
    progress: &dyn ProgressSink,
) -> Result<SprintReport> {
    let window = parse_window(start, end)?;

    progress.update("Getting issue list...", 0, 1);
    let search = api.search_keys(jql, KEY_PAGE_SIZE)?;
    info!(jql, count = search.keys.len(), "Analyzing sprint by date range");
    if search.keys.is_empty() {
        return Ok(SprintReport::new(window, Vec::new(), false));
    }

    let downloads = fetch_all(
        &search.keys,
        workers,
        "Stage 1/2: Analyzing sprint transitions...",
        progress,
        |key| api.get_issue(key, true),
    )?;

    let mut rows = Vec::new();
    for (key, result) in downloads {
        match result {
            Ok(issue) => rows.extend(rows_for(&issue, &window)),
            Err(err) => {
                warn!(key = %key, error = %err, "Issue failed during sprint analysis");
                rows.push(SprintRow::error(&key, &err));
            }
        }
    }
    Ok(SprintReport::new(window, rows, true))
}

fn sprint_date(id: u64, field: &str, value: Option<&str>) -> Result<DateTime<Utc>> {
    let value = value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| JiraMetricsError::Sprint {
            id,
            reason: "does not have start and end dates set".to_string(),
        })?;
    parse_jira_timestamp(value).ok_or_else(|| JiraMetricsError::invalid_date(field, value))
}

/// Same report for a sprint id, using the sprint's own dates and issues.
///
/// # Errors
///
/// Returns a `Sprint` error when the sprint or its issues cannot be fetched
/// or the sprint lacks dates.
pub fn analyze_sprint_by_id(
    api: &dyn JiraApi,
    sprint_id: u64,
    progress: &dyn ProgressSink,
) -> Result<SprintReport> {
    progress.update("Getting sprint details...", 0, 1);
    let sprint = api.get_sprint(sprint_id).map_err(|err| JiraMetricsError::Sprint {
        id: sprint_id,
        reason: format!("could not retrieve sprint: {err}"),
    })?;
    let window = SprintWindow::new(
        sprint_date(sprint_id, "startDate", sprint.start_date.as_deref())?,
        sprint_date(sprint_id, "endDate", sprint.end_date.as_deref())?,
    )?;

    progress.update("Getting sprint issues...", 0, 1);
    let issues = api
        .get_sprint_issues(sprint_id)
        .map_err(|err| JiraMetricsError::Sprint {
            id: sprint_id,
            reason: format!("could not retrieve issues: {err}"),
        })?;
    info!(sprint_id, name = %sprint.name, count = issues.len(), "Analyzing sprint");
    if issues.is_empty() {
        return Ok(SprintReport::new(window, Vec::new(), false));
    }

    let total = issues.len();
    let mut rows = Vec::new();
    for (idx, issue) in issues.iter().enumerate() {
        rows.extend(rows_for(issue, &window));
        progress.update("Analyzing sprint transitions...", idx + 1, total);
    }
    Ok(SprintReport::new(window, rows, true))
}

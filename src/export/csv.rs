//! CSV export of issues with profile-selected fields and metrics.

use super::KEY_PAGE_SIZE;
use crate::client::JiraApi;
use crate::config::ExportProfile;
use crate::error::Result;
use crate::format::csv::to_csv_string;
use crate::format::format_field_value;
use crate::metrics::{
    BusinessWindow, CommentMetrics, comment_metrics, compute_time_in_status,
    count_sequence_occurrences, extract_status_changes,
};
use crate::model::{FieldCatalog, Issue};
use crate::util::{ProgressSink, atomic_write, fetch_all};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{info, warn};

const DOWNLOAD_STAGE: &str = "Stage 1/2: Downloading issues...";
const WRITE_STAGE: &str = "Stage 2/2: Writing CSV...";

/// A finished CSV table, ready to be written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvExport {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Keys whose download failed; they appear as key-only rows.
    pub failed: Vec<String>,
}

impl CsvExport {
    #[must_use]
    pub fn to_csv_string(&self) -> String {
        to_csv_string(&self.headers, &self.rows)
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        atomic_write(path, self.to_csv_string().as_bytes())
    }
}

/// Everything computed for one downloaded issue.
#[derive(Debug, Default)]
struct IssueRecord {
    key: String,
    fields: Vec<String>,
    transitions: Vec<usize>,
    comments: CommentMetrics,
    time_in_status: BTreeMap<String, f64>,
}

/// Download every issue matched by `jql` and tabulate it per `profile`.
///
/// # Errors
///
/// Returns an error if the business hours are invalid or the key search fails.
/// Individual issue failures are logged and produce key-only rows.
pub fn export_csv(
    api: &dyn JiraApi,
    jql: &str,
    profile: &ExportProfile,
    catalog: &FieldCatalog,
    workers: usize,
    progress: &dyn ProgressSink,
    now: DateTime<Utc>,
) -> Result<CsvExport> {
    let window = profile
        .business_hours
        .as_ref()
        .map(|bh| bh.resolve())
        .transpose()?;

    let search = api.search_keys(jql, KEY_PAGE_SIZE)?;
    info!(jql, count = search.keys.len(), profile = %profile.name, "Exporting CSV");

    let downloads = fetch_all(&search.keys, workers, DOWNLOAD_STAGE, progress, |key| {
        let issue = api.get_issue(key, true)?;
        Ok(build_record(&issue, profile, catalog, window.as_ref(), now))
    })?;

    let mut records = Vec::with_capacity(downloads.len());
    let mut failed = Vec::new();
    for (key, result) in downloads {
        match result {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(key = %key, error = %err, "Issue download failed; writing key only");
                failed.push(key.clone());
                records.push(IssueRecord {
                    key,
                    ..IssueRecord::default()
                });
            }
        }
    }
    records.sort_by(|a, b| a.key.cmp(&b.key));

    let statuses: BTreeSet<&str> = records
        .iter()
        .flat_map(|record| record.time_in_status.keys().map(String::as_str))
        .collect();

    let headers = build_headers(profile, catalog, &statuses);
    let total = records.len();
    progress.update(WRITE_STAGE, 0, total);

    let rows = records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let row = build_row(record, profile, &statuses);
            progress.update(WRITE_STAGE, idx + 1, total);
            row
        })
        .collect();

    Ok(CsvExport {
        headers,
        rows,
        failed,
    })
}

fn build_record(
    issue: &Issue,
    profile: &ExportProfile,
    catalog: &FieldCatalog,
    window: Option<&BusinessWindow>,
    now: DateTime<Utc>,
) -> IssueRecord {
    let fields = profile
        .selected_field_ids
        .iter()
        .map(|id| {
            let value = issue.fields.get(id).unwrap_or(&Value::Null);
            format_field_value(catalog.display_name(id), value)
        })
        .collect();

    let changes = extract_status_changes(issue);
    let transitions = profile
        .transition_rules
        .iter()
        .map(|rule| count_sequence_occurrences(&changes, &rule.sequence))
        .collect();

    let comments = if profile.metrics.any_comment_metric() {
        comment_metrics(issue)
    } else {
        CommentMetrics::default()
    };

    let time_in_status = if profile.metrics.time_in_status {
        compute_time_in_status(issue, window, now)
    } else {
        BTreeMap::new()
    };

    IssueRecord {
        key: issue.key.clone(),
        fields,
        transitions,
        comments,
        time_in_status,
    }
}

fn build_headers(
    profile: &ExportProfile,
    catalog: &FieldCatalog,
    statuses: &BTreeSet<&str>,
) -> Vec<String> {
    let mut headers = vec!["key".to_string()];
    headers.extend(
        profile
            .selected_field_ids
            .iter()
            .map(|id| catalog.display_name(id).to_string()),
    );
    headers.extend(profile.transition_rules.iter().map(|rule| rule.name.clone()));

    let metrics = &profile.metrics;
    if metrics.comment_count {
        headers.push("comment_count".to_string());
    }
    if metrics.comment_length {
        headers.push("comment_length".to_string());
    }
    if metrics.commenter_count {
        headers.push("commenter_count".to_string());
    }
    if metrics.time_in_status {
        headers.extend(statuses.iter().map(|status| format!("TIS: {status}")));
    }
    headers
}

fn build_row(record: &IssueRecord, profile: &ExportProfile, statuses: &BTreeSet<&str>) -> Vec<String> {
    let mut row = vec![record.key.clone()];

    for idx in 0..profile.selected_field_ids.len() {
        row.push(record.fields.get(idx).cloned().unwrap_or_default());
    }
    for idx in 0..profile.transition_rules.len() {
        row.push(record.transitions.get(idx).copied().unwrap_or(0).to_string());
    }

    let metrics = &profile.metrics;
    if metrics.comment_count {
        row.push(record.comments.comment_count.to_string());
    }
    if metrics.comment_length {
        row.push(record.comments.comment_length.to_string());
    }
    if metrics.commenter_count {
        row.push(record.comments.commenter_count.to_string());
    }
    if metrics.time_in_status {
        for status in statuses {
            let hours = record.time_in_status.get(*status).copied().unwrap_or(0.0);
            row.push(format_hours(hours));
        }
    }
    row
}

/// Hours rounded to two decimals in shortest form, always with a decimal point.
fn format_hours(hours: f64) -> String {
    let rounded = (hours * 100.0).round() / 100.0;
    let text = format!("{rounded}");
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeJira;
    use crate::config::{MetricFlags, TransitionRule};
    use crate::metrics::BusinessHours;
    use crate::model::FieldDef;
    use crate::util::NoProgress;
    use chrono::TimeZone;
    use serde_json::json;

    fn catalog() -> FieldCatalog {
        FieldCatalog::from_defs(&[
            FieldDef {
                id: "summary".to_string(),
                name: "Summary".to_string(),
                custom: false,
            },
            FieldDef {
                id: "customfield_10020".to_string(),
                name: "Sprint".to_string(),
                custom: true,
            },
        ])
    }

    fn issue(key: &str) -> Value {
        json!({
            "id": "1",
            "key": key,
            "fields": {
                "summary": format!("Summary of {key}"),
                "created": "2024-01-01T00:00:00.000+0000",
                "status": {"name": "Done"},
                "customfield_10020": [{"id": 1, "name": "S1", "state": "closed"}],
                "comment": {"total": 1, "comments": [
                    {"author": {"displayName": "Ann"}, "body": "hello"}
                ]}
            },
            "changelog": {"histories": [
                {"created": "2024-01-01T10:00:00.000+0000",
                 "items": [{"field": "status", "fromString": "To Do", "toString": "In Progress"}]},
                {"created": "2024-01-02T10:00:00.000+0000",
                 "items": [{"field": "status", "fromString": "In Progress", "toString": "Done"}]}
            ]}
        })
    }

    fn profile() -> ExportProfile {
        ExportProfile {
            name: "test".to_string(),
            selected_field_ids: vec!["summary".to_string(), "customfield_10020".to_string()],
            transition_rules: vec![TransitionRule {
                name: "Started".to_string(),
                sequence: vec!["To Do".to_string(), "In Progress".to_string()],
            }],
            metrics: MetricFlags {
                time_in_status: true,
                comment_count: true,
                comment_length: true,
                commenter_count: true,
            },
            ..ExportProfile::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 3, 10, 0, 0).unwrap()
    }

    #[test]
    fn headers_and_rows() {
        let api = FakeJira::new().with_issue(issue("P-2")).with_issue(issue("P-1"));
        let export = export_csv(&api, "project = P", &profile(), &catalog(), 2, &NoProgress, now()).unwrap();

        assert_eq!(
            export.headers,
            vec![
                "key",
                "Summary",
                "Sprint",
                "Started",
                "comment_count",
                "comment_length",
                "commenter_count",
                "TIS: Done",
                "TIS: In Progress",
                "TIS: To Do",
            ]
        );
        assert_eq!(export.rows.len(), 2);
        assert_eq!(
            export.rows[0],
            vec!["P-1", "Summary of P-1", "S1 (closed)", "1", "1", "5", "1", "24.0", "24.0", "10.0"]
        );
        assert_eq!(export.rows[1][0], "P-2");
        assert!(export.failed.is_empty());
    }

    #[test]
    fn failed_issue_becomes_key_only_row() {
        let api = FakeJira::new().with_issue(issue("P-1")).with_failing("P-0");
        let export = export_csv(&api, "x", &profile(), &catalog(), 4, &NoProgress, now()).unwrap();

        assert_eq!(export.failed, vec!["P-0"]);
        assert_eq!(
            export.rows[0],
            vec!["P-0", "", "", "0", "0", "0", "0", "0.0", "0.0", "0.0"]
        );
    }

    #[test]
    fn metric_columns_follow_flags() {
        let mut profile = profile();
        profile.metrics = MetricFlags::default();
        profile.transition_rules.clear();
        let api = FakeJira::new().with_issue(issue("P-1"));
        let export = export_csv(&api, "x", &profile, &catalog(), 1, &NoProgress, now()).unwrap();
        assert_eq!(export.headers, vec!["key", "Summary", "Sprint"]);
        assert_eq!(
            export.to_csv_string(),
            "key,Summary,Sprint\r\nP-1,Summary of P-1,S1 (closed)\r\n"
        );
    }

    #[test]
    fn business_hours_apply_when_configured() {
        let mut profile = profile();
        profile.business_hours = Some(BusinessHours::default());
        let api = FakeJira::new().with_issue(issue("P-1"));
        let export = export_csv(&api, "x", &profile, &catalog(), 1, &NoProgress, now()).unwrap();
        // Monday 2024-01-01 onwards, 09:00-17:00 UTC.
        let row = &export.rows[0];
        assert_eq!(&row[7..], &["8.0".to_string(), "8.0".to_string(), "1.0".to_string()]);
    }

    #[test]
    fn invalid_business_hours_fail_before_download() {
        let mut profile = profile();
        profile.business_hours = Some(BusinessHours {
            timezone: "Mars/Olympus".to_string(),
            ..BusinessHours::default()
        });
        let api = FakeJira::new().with_issue(issue("P-1"));
        assert!(export_csv(&api, "x", &profile, &catalog(), 1, &NoProgress, now()).is_err());
    }

    #[test]
    fn format_hours_rounds_to_two_places_and_keeps_a_point() {
        assert_eq!(format_hours(1.0), "1.0");
        assert_eq!(format_hours(1.256), "1.26");
        assert_eq!(format_hours(0.1), "0.1");
        assert_eq!(format_hours(0.0), "0.0");
    }
}

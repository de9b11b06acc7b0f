//! Status timelines: per-issue intervals between tracked transitions, and
//! the HTML report built from them.

mod palette;
mod render;

pub use palette::{generate_color_palette, validate_color};
pub use render::{format_duration, render_html};

use crate::client::JiraApi;
use crate::error::{JiraMetricsError, Result};
use crate::metrics::extract_status_changes;
use crate::util::{ProgressSink, fetch_all};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Page size for the key search.
const SEARCH_PAGE_SIZE: u64 = 1000;

const FETCH_STAGE: &str = "Fetching issues...";
const ANALYZE_STAGE: &str = "Analyzing issue history...";
const BUILD_STAGE: &str = "Building timeline...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub status: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// True when the status has a configured order.
    pub tracked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueTimeline {
    pub key: String,
    pub segments: Vec<Segment>,
}

impl IssueTimeline {
    /// Seconds spent in each tracked status, clipped to `[start, end]`.
    #[must_use]
    pub fn tracked_seconds(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        for segment in self.segments.iter().filter(|segment| segment.tracked) {
            let seg_start = segment.start.max(start);
            let seg_end = segment.end.min(end);
            if seg_end > seg_start {
                let seconds = (seg_end - seg_start).num_milliseconds() as f64 / 1000.0;
                *totals.entry(segment.status.clone()).or_insert(0.0) += seconds;
            }
        }
        totals
    }
}

/// Everything the report needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Timeline {
    pub issues: Vec<IssueTimeline>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub status_order: BTreeMap<String, i64>,
    pub status_colors: BTreeMap<String, String>,
    /// Keys whose download failed.
    pub failed: Vec<String>,
}

impl Timeline {
    /// Tracked statuses by configured order, then name.
    #[must_use]
    pub fn ordered_statuses(&self) -> Vec<&str> {
        sorted_by_order(&self.status_order)
    }
}

fn sorted_by_order(order: &BTreeMap<String, i64>) -> Vec<&str> {
    let mut statuses: Vec<(&str, i64)> = order
        .iter()
        .map(|(name, rank)| (name.as_str(), *rank))
        .collect();
    statuses.sort_by_key(|(_, rank)| *rank);
    statuses.into_iter().map(|(name, _)| name).collect()
}

/// Fetch every issue matched by `jql` and cut its history into segments.
///
/// `custom_colors` must already be validated; statuses without one get a
/// palette color by order.
///
/// # Errors
///
/// Returns `NoTrackedStatuses` when `status_order` is empty, or an error if
/// the key search fails. Issues that fail to download are skipped.
#[allow(clippy::too_many_arguments)]
pub fn build_timeline(
    api: &dyn JiraApi,
    jql: &str,
    status_order: &BTreeMap<String, i64>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    custom_colors: &BTreeMap<String, String>,
    workers: usize,
    progress: &dyn ProgressSink,
    now: DateTime<Utc>,
) -> Result<Timeline> {
    if status_order.is_empty() {
        return Err(JiraMetricsError::NoTrackedStatuses);
    }

    progress.update(FETCH_STAGE, 0, 1);
    let search = api.search_keys(jql, SEARCH_PAGE_SIZE)?;
    info!(jql, count = search.keys.len(), "Building timeline");

    let mut timeline = Timeline {
        status_order: status_order.clone(),
        ..Timeline::default()
    };
    if search.keys.is_empty() {
        return Ok(timeline);
    }

    let downloads = fetch_all(&search.keys, workers, ANALYZE_STAGE, progress, |key| {
        api.get_issue(key, true)
    })?;

    progress.update(BUILD_STAGE, 0, 1);
    let final_end = end.unwrap_or(now);
    let mut all_dates = Vec::new();

    for (key, result) in downloads {
        let issue = match result {
            Ok(issue) => issue,
            Err(err) => {
                warn!(key = %key, error = %err, "Skipping issue that failed to download");
                timeline.failed.push(key);
                continue;
            }
        };

        let changes = extract_status_changes(&issue);
        let Some(first) = changes.iter().position(|change| {
            change
                .to
                .as_ref()
                .is_some_and(|status| status_order.contains_key(status))
        }) else {
            continue;
        };

        let mut segments = Vec::new();
        let mut current = changes[first].to.clone().unwrap_or_default();
        let mut segment_start = changes[first].at;
        all_dates.push(segment_start);

        for change in &changes[first + 1..] {
            segments.push(Segment {
                tracked: status_order.contains_key(&current),
                status: current,
                start: segment_start,
                end: change.at,
            });
            all_dates.push(change.at);
            current = change.to.clone().unwrap_or_default();
            segment_start = change.at;
        }
        segments.push(Segment {
            tracked: status_order.contains_key(&current),
            status: current,
            start: segment_start,
            end: final_end,
        });
        all_dates.push(final_end);

        timeline.issues.push(IssueTimeline { key, segments });
    }

    let (Some(min), Some(max)) = (all_dates.iter().min(), all_dates.iter().max()) else {
        return Ok(timeline);
    };
    timeline.start = Some(start.unwrap_or(*min));
    timeline.end = Some(end.unwrap_or(*max));

    let ordered = sorted_by_order(status_order);
    let palette = generate_color_palette(ordered.len());
    timeline.status_colors = ordered
        .iter()
        .zip(palette)
        .map(|(status, auto)| {
            let color = custom_colors.get(*status).cloned().unwrap_or(auto);
            ((*status).to_string(), color)
        })
        .collect();

    progress.update(BUILD_STAGE, 1, 1);
    info!(
        issues = timeline.issues.len(),
        failed = timeline.failed.len(),
        "Timeline built"
    );
    Ok(timeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeJira;
    use crate::util::NoProgress;
    use chrono::TimeZone;
    use serde_json::{Value, json};

    pub(super) fn utc(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
    }

    fn transition(at: &str, from: &str, to: &str) -> Value {
        json!({"created": at, "items": [{"field": "status", "fromString": from, "toString": to}]})
    }

    fn issue(key: &str, histories: Vec<Value>) -> Value {
        json!({"key": key, "fields": {"status": {"name": "x"}}, "changelog": {"histories": histories}})
    }

    fn order() -> BTreeMap<String, i64> {
        BTreeMap::from([
            ("In Progress".to_string(), 1),
            ("Review".to_string(), 2),
            ("Done".to_string(), 3),
        ])
    }

    fn fixture() -> FakeJira {
        FakeJira::new()
            .with_issue(issue(
                "T-1",
                vec![
                    transition("2024-01-01T09:00:00.000+0000", "To Do", "Backlog"),
                    transition("2024-01-02T09:00:00.000+0000", "Backlog", "In Progress"),
                    transition("2024-01-03T09:00:00.000+0000", "In Progress", "Blocked"),
                    transition("2024-01-04T09:00:00.000+0000", "Blocked", "Done"),
                ],
            ))
            .with_issue(issue(
                "T-2",
                vec![transition("2024-01-01T09:00:00.000+0000", "To Do", "Backlog")],
            ))
            .with_failing("T-3")
    }

    #[test]
    fn segments_start_at_first_tracked_transition() {
        let timeline = build_timeline(
            &fixture(),
            "x",
            &order(),
            None,
            None,
            &BTreeMap::new(),
            2,
            &NoProgress,
            utc(5, 9),
        )
        .unwrap();

        assert_eq!(timeline.issues.len(), 1);
        assert_eq!(timeline.failed, vec!["T-3"]);
        let segments = &timeline.issues[0].segments;
        let summary: Vec<(&str, bool)> = segments
            .iter()
            .map(|s| (s.status.as_str(), s.tracked))
            .collect();
        assert_eq!(
            summary,
            vec![("In Progress", true), ("Blocked", false), ("Done", true)]
        );
        assert_eq!(segments[2].end, utc(5, 9));
        assert_eq!(timeline.start, Some(utc(2, 9)));
        assert_eq!(timeline.end, Some(utc(5, 9)));
    }

    #[test]
    fn colors_follow_order_with_custom_overrides() {
        let custom = BTreeMap::from([("Review".to_string(), "#123456".to_string())]);
        let timeline = build_timeline(
            &fixture(),
            "x",
            &order(),
            Some(utc(1, 0)),
            Some(utc(6, 0)),
            &custom,
            1,
            &NoProgress,
            utc(9, 0),
        )
        .unwrap();

        assert_eq!(timeline.start, Some(utc(1, 0)));
        assert_eq!(timeline.issues[0].segments[2].end, utc(6, 0));
        assert_eq!(timeline.status_colors.get("In Progress").unwrap(), "#D32F2F");
        assert_eq!(timeline.status_colors.get("Review").unwrap(), "#123456");
        assert_eq!(timeline.status_colors.get("Done").unwrap(), "#2E7D32");
        assert_eq!(timeline.ordered_statuses(), vec!["In Progress", "Review", "Done"]);
    }

    #[test]
    fn no_tracked_transitions_yields_empty_timeline() {
        let api = FakeJira::new().with_issue(issue(
            "T-2",
            vec![transition("2024-01-01T09:00:00.000+0000", "To Do", "Backlog")],
        ));
        let timeline = build_timeline(
            &api, "x", &order(), None, None, &BTreeMap::new(), 1, &NoProgress, utc(5, 0),
        )
        .unwrap();
        assert!(timeline.issues.is_empty());
        assert!(timeline.start.is_none());
        assert!(timeline.status_colors.is_empty());
    }

    #[test]
    fn empty_order_is_rejected() {
        let err = build_timeline(
            &fixture(),
            "x",
            &BTreeMap::new(),
            None,
            None,
            &BTreeMap::new(),
            1,
            &NoProgress,
            utc(5, 0),
        )
        .unwrap_err();
        assert!(matches!(err, JiraMetricsError::NoTrackedStatuses));
    }

    #[test]
    fn tracked_seconds_clip_to_bounds() {
        let issue = IssueTimeline {
            key: "T-1".to_string(),
            segments: vec![
                Segment {
                    status: "In Progress".to_string(),
                    start: utc(1, 0),
                    end: utc(2, 0),
                    tracked: true,
                },
                Segment {
                    status: "Blocked".to_string(),
                    start: utc(2, 0),
                    end: utc(3, 0),
                    tracked: false,
                },
            ],
        };
        let seconds = issue.tracked_seconds(utc(1, 12), utc(3, 0));
        assert_eq!(seconds.len(), 1);
        assert!((seconds["In Progress"] - 43_200.0).abs() < 1e-6);
    }
}

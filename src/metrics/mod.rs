//! Changelog analysis: status transitions, time in status, transition
//! sequences and comment statistics.

mod business_hours;

pub use business_hours::{BusinessHours, BusinessWindow};

use crate::format::adf::{AdfOptions, normalize_to_markdown};
use crate::model::{Issue, StatusChange};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Every status change in the changelog, oldest first.
///
/// Histories with an unparsable `created` timestamp are skipped.
#[must_use]
pub fn extract_status_changes(issue: &Issue) -> Vec<StatusChange> {
    let mut changes: Vec<StatusChange> = issue
        .histories()
        .iter()
        .filter_map(|history| history.created_at().map(|at| (history, at)))
        .flat_map(|(history, at)| {
            history
                .items
                .iter()
                .filter(|item| item.field == "status")
                .map(move |item| StatusChange {
                    from: item.from_name.clone(),
                    to: item.to_name.clone(),
                    at,
                })
        })
        .collect();
    changes.sort_by_key(|change| change.at);
    changes
}

/// Hours spent in each status up to `now`.
///
/// With a business window each segment counts only its working-hours overlap.
#[must_use]
pub fn compute_time_in_status(
    issue: &Issue,
    window: Option<&BusinessWindow>,
    now: DateTime<Utc>,
) -> BTreeMap<String, f64> {
    let changes = extract_status_changes(issue);
    let created = issue.created();
    let current = issue.status_name().map(str::to_string);

    let mut segments: Vec<(Option<String>, DateTime<Utc>, DateTime<Utc>)> = Vec::new();
    if let Some(first) = changes.first() {
        if let Some(created) = created {
            let initial = first.from.clone().or_else(|| current.clone());
            segments.push((initial, created, first.at));
        }
        for (idx, change) in changes.iter().enumerate() {
            let until = changes.get(idx + 1).map_or(now, |next| next.at);
            segments.push((change.to.clone(), change.at, until));
        }
    } else if let (Some(created), Some(status)) = (created, current) {
        segments.push((Some(status), created, now));
    }

    let mut totals = BTreeMap::new();
    for (status, start, end) in segments {
        let Some(status) = status.filter(|name| !name.is_empty()) else {
            continue;
        };
        let hours = window.map_or_else(
            || (end - start).num_milliseconds() as f64 / 3_600_000.0,
            |window| window.overlap_hours(start, end),
        );
        *totals.entry(status).or_insert(0.0) += hours.max(0.0);
    }
    totals
}

/// Count how many times `sequence` occurs as consecutive status changes.
///
/// The sequence `[A, B, C]` is matched as the pairs `A→B`, `B→C`. Any other
/// change resets the match, except one equal to the first pair which restarts
/// it.
#[must_use]
pub fn count_sequence_occurrences(changes: &[StatusChange], sequence: &[String]) -> usize {
    if sequence.len() < 2 {
        return 0;
    }
    let pairs: Vec<(&str, &str)> = sequence
        .windows(2)
        .map(|pair| (pair[0].as_str(), pair[1].as_str()))
        .collect();

    let matches = |change: &StatusChange, (from, to): (&str, &str)| {
        change.from.as_deref() == Some(from) && change.to.as_deref() == Some(to)
    };

    let mut count = 0;
    let mut progress = 0;
    for change in changes {
        if matches(change, pairs[progress]) {
            progress += 1;
            if progress == pairs.len() {
                count += 1;
                progress = 0;
            }
        } else {
            progress = usize::from(matches(change, pairs[0]));
        }
    }
    count
}

/// Comment statistics for the CSV export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommentMetrics {
    pub comment_count: usize,
    pub comment_length: usize,
    pub commenter_count: usize,
}

/// Count comments, their rendered text length, and distinct authors.
#[must_use]
pub fn comment_metrics(issue: &Issue) -> CommentMetrics {
    let comments = issue.comments();
    let options = AdfOptions::for_comments();
    let mut commenters = HashSet::new();
    let mut total_length = 0;

    for comment in comments {
        let body = comment.get("body").unwrap_or(&Value::Null);
        total_length += normalize_to_markdown(body, &options).trim().chars().count();

        let author = comment.get("author");
        let name = author
            .and_then(|a| a.get("displayName"))
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .or_else(|| author.and_then(|a| a.get("accountId")).and_then(Value::as_str));
        if let Some(name) = name {
            commenters.insert(name.to_string());
        }
    }

    CommentMetrics {
        comment_count: comments.len(),
        comment_length: total_length,
        commenter_count: commenters.len(),
    }
}

//! Static HTML rendering of a [`Timeline`].

use super::{IssueTimeline, Timeline};
use crate::format::escape_html;
use crate::util::status_css_class;
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc, Weekday};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

const STYLE: &str = include_str!("assets/report.css");
const SCRIPT: &str = include_str!("assets/report.js");

const SEGMENT_TIME: &str = "%b %d %H:%M";
const DEFAULT_SUGGESTION: &str = "#999999";

/// Suggested colors for untracked statuses, matched on the lower-cased name.
const SUGGESTIONS: &[(&str, &str)] = &[
    ("awaiting code review", "#9C27B0"),
    ("code review", "#9C27B0"),
    ("ready for deployment", "#FF6F00"),
    ("ready for qa", "#03A9F4"),
    ("deployment", "#FF9800"),
    ("qa", "#2196F3"),
    ("testing", "#2196F3"),
    ("blocked", "#F44336"),
    ("on hold", "#FFC107"),
    ("review", "#4CAF50"),
    ("approval", "#E91E63"),
    ("merge", "#00BCD4"),
    ("pending", "#9E9E9E"),
    ("backlog", "#795548"),
];

/// Compact duration: `45s`, `12m`, `3.5h`, `2.1d`.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("{}s", seconds as i64)
    } else if seconds < 3600.0 {
        format!("{}m", (seconds / 60.0) as i64)
    } else if seconds < 86_400.0 {
        format!("{:.1}h", seconds / 3600.0)
    } else {
        format!("{:.1}d", seconds / 86_400.0)
    }
}

/// Render the full report document.
#[must_use]
pub fn render_html(timeline: &Timeline, jql: &str, project: Option<&str>) -> String {
    let (Some(start), Some(end)) = (timeline.start, timeline.end) else {
        return no_data_document();
    };
    if timeline.issues.is_empty() || end <= start {
        return no_data_document();
    }
    let bounds = Bounds { start, end };

    let mut html = String::with_capacity(16 * 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Status Timeline</title>\n<style>\n");
    html.push_str(STYLE);
    html.push_str(&status_styles(timeline));
    html.push_str("</style>\n</head>\n<body>\n<h1>Status Timeline</h1>\n");

    html.push_str(&info_block(timeline, &bounds, jql, project));
    html.push_str(&timeline_block(timeline, &bounds));
    html.push_str(&summary_table(timeline, &bounds));
    html.push_str(&legend(timeline));
    html.push_str(&color_panel(timeline));

    html.push_str("<script>\n");
    html.push_str(SCRIPT);
    html.push_str("</script>\n</body>\n</html>\n");
    html
}

fn no_data_document() -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Status Timeline</title>\n<style>\n{STYLE}</style>\n</head>\n<body>\n\
         <h1>Status Timeline</h1>\n<div class=\"empty\">No data to display</div>\n</body>\n</html>\n"
    )
}

struct Bounds {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Bounds {
    fn seconds(&self) -> f64 {
        seconds_between(self.start, self.end)
    }

    fn percent(&self, at: DateTime<Utc>) -> f64 {
        seconds_between(self.start, at) / self.seconds() * 100.0
    }
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

fn midnight(at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&at.date_naive().and_time(chrono::NaiveTime::MIN))
}

fn is_weekend(at: DateTime<Utc>) -> bool {
    matches!(at.weekday(), Weekday::Sat | Weekday::Sun)
}

#[derive(Debug, Clone, PartialEq)]
struct ScalePoint {
    percent: f64,
    label: String,
    weekend: bool,
}

fn scale_points(bounds: &Bounds) -> Vec<ScalePoint> {
    let hours = bounds.seconds() / 3600.0;
    let mut points = Vec::new();

    if hours < 24.0 {
        let num_hours = hours as i64 + 1;
        let interval = (num_hours / 8).max(1);
        let mut i = 0;
        while i < num_hours {
            let at = bounds.start + Duration::hours(i);
            if at <= bounds.end {
                points.push(ScalePoint {
                    percent: bounds.percent(at),
                    label: at.format(SEGMENT_TIME).to_string(),
                    weekend: false,
                });
            }
            i += interval;
        }
        return points;
    }

    let days = (bounds.end - bounds.start).num_days() + 1;
    let interval = match days {
        ..=30 => 1,
        31..=90 => 3,
        _ => 7,
    };
    let mut at = midnight(bounds.start);
    if at < bounds.start {
        at += Duration::days(1);
    }
    while at <= bounds.end {
        points.push(ScalePoint {
            percent: bounds.percent(at),
            label: at.format("%b %d").to_string(),
            weekend: is_weekend(at),
        });
        at += Duration::days(interval);
    }

    let end_label = bounds.end.format("%b %d").to_string();
    if points.last().is_none_or(|last| last.label != end_label) {
        points.push(ScalePoint {
            percent: 100.0,
            label: end_label,
            weekend: is_weekend(bounds.end),
        });
    }
    points
}

/// Divider positions as `(percent, css class)`.
fn weekend_dividers(bounds: &Bounds) -> Vec<(f64, &'static str)> {
    if bounds.seconds() < 86_400.0 {
        return Vec::new();
    }
    let mut dividers = Vec::new();
    let mut day = midnight(bounds.start);
    while day <= bounds.end {
        let percent = bounds.percent(day);
        match day.weekday() {
            Weekday::Sat if (0.0..=100.0).contains(&percent) => {
                dividers.push((percent, "weekend-start"));
            }
            Weekday::Mon if day > bounds.start => dividers.push((percent, "weekend-end")),
            _ => {}
        }
        day += Duration::days(1);
    }
    dividers
}

fn status_styles(timeline: &Timeline) -> String {
    let mut css = String::new();
    for (status, color) in &timeline.status_colors {
        let _ = writeln!(
            css,
            ".{} {{ background-color: {color}; }}",
            status_css_class(status)
        );
    }
    css
}

fn info_block(timeline: &Timeline, bounds: &Bounds, jql: &str, project: Option<&str>) -> String {
    let mut html = String::from("<div class=\"info\">\n");
    let _ = writeln!(html, "<div><strong>Query:</strong> <code>{}</code></div>", escape_html(jql));
    if let Some(project) = project.filter(|p| !p.is_empty()) {
        let _ = writeln!(html, "<div><strong>Project:</strong> {}</div>", escape_html(project));
    }
    let _ = writeln!(
        html,
        "<div><strong>Timeline:</strong> {} - {}</div>",
        bounds.start.format("%b %d, %Y %H:%M"),
        bounds.end.format("%b %d, %Y %H:%M")
    );
    let _ = writeln!(
        html,
        "<div><strong>Duration:</strong> {}</div>",
        format_duration(bounds.seconds())
    );
    let _ = writeln!(html, "<div><strong>Issues:</strong> {}</div>", timeline.issues.len());
    html.push_str("</div>\n");
    html
}

fn sorted_issues(timeline: &Timeline) -> Vec<&IssueTimeline> {
    let mut issues: Vec<&IssueTimeline> = timeline.issues.iter().collect();
    issues.sort_by_key(|issue| issue.segments.first().map(|segment| segment.start));
    issues
}

fn timeline_block(timeline: &Timeline, bounds: &Bounds) -> String {
    let dividers: String = weekend_dividers(bounds)
        .into_iter()
        .map(|(percent, class)| format!("<div class=\"divider {class}\" style=\"left: {percent:.2}%;\"></div>"))
        .collect();

    let mut html = String::from("<div class=\"timeline\">\n<div class=\"scale\">\n");
    for point in scale_points(bounds) {
        let class = if point.weekend {
            "scale-label weekend"
        } else {
            "scale-label"
        };
        let _ = writeln!(
            html,
            "<span class=\"{class}\" style=\"left: {:.2}%;\">{}</span>",
            point.percent, point.label
        );
    }
    html.push_str("</div>\n");

    for issue in sorted_issues(timeline) {
        let _ = write!(
            html,
            "<div class=\"row\"><div class=\"row-key\">{}</div><div class=\"bars\">{dividers}",
            escape_html(&issue.key)
        );
        for segment in &issue.segments {
            let seg_start = segment.start.max(bounds.start);
            let seg_end = segment.end.min(bounds.end);
            if seg_end <= seg_start {
                continue;
            }
            let left = bounds.percent(seg_start);
            let width = bounds.percent(seg_end) - left;
            let span = format!(
                "{}: {} - {}",
                segment.status,
                seg_start.format(SEGMENT_TIME),
                seg_end.format(SEGMENT_TIME)
            );
            let label = if width > 5.0 {
                format!("<span class=\"segment-label\">{}</span>", escape_html(&segment.status))
            } else {
                String::new()
            };
            if segment.tracked {
                let _ = write!(
                    html,
                    "<div class=\"status-segment {}\" style=\"left: {left:.2}%; width: {width:.2}%;\" title=\"{}\">{label}</div>",
                    status_css_class(&segment.status),
                    escape_html(&span)
                );
            } else {
                let _ = write!(
                    html,
                    "<div class=\"status-segment status-untracked\" data-status=\"{}\" style=\"left: {left:.2}%; width: {width:.2}%;\" title=\"{}\">{label}</div>",
                    escape_html(&segment.status),
                    escape_html(&format!("Untracked: {span}"))
                );
            }
        }
        html.push_str("</div></div>\n");
    }
    html.push_str("</div>\n");
    html
}

fn summary_table(timeline: &Timeline, bounds: &Bounds) -> String {
    let statuses = timeline.ordered_statuses();
    let mut html = String::from("<h2>Time in Status</h2>\n<table class=\"summary\">\n<thead><tr><th>Issue</th>");
    for status in &statuses {
        let _ = write!(html, "<th>{}</th>", escape_html(status));
    }
    html.push_str("<th>Total</th></tr></thead>\n<tbody>\n");

    let mut column_totals: BTreeMap<&str, f64> = BTreeMap::new();
    let mut grand_total = 0.0;
    for issue in sorted_issues(timeline) {
        let seconds = issue.tracked_seconds(bounds.start, bounds.end);
        let _ = write!(html, "<tr><td>{}</td>", escape_html(&issue.key));
        let mut row_total = 0.0;
        for status in &statuses {
            let value = seconds.get(*status).copied().unwrap_or(0.0);
            row_total += value;
            *column_totals.entry(*status).or_insert(0.0) += value;
            let _ = write!(html, "<td>{}</td>", format_duration(value));
        }
        grand_total += row_total;
        let _ = writeln!(html, "<td>{}</td></tr>", format_duration(row_total));
    }

    html.push_str("</tbody>\n<tfoot><tr><td>Total</td>");
    for status in &statuses {
        let value = column_totals.get(status).copied().unwrap_or(0.0);
        let _ = write!(html, "<td>{}</td>", format_duration(value));
    }
    let _ = writeln!(html, "<td>{}</td></tr></tfoot>", format_duration(grand_total));
    html.push_str("</table>\n");
    html
}

fn legend(timeline: &Timeline) -> String {
    let mut html = String::from("<div class=\"legend\">\n");
    for status in timeline.ordered_statuses() {
        let _ = writeln!(
            html,
            "<div class=\"legend-item\"><span class=\"swatch {}\"></span>{}</div>",
            status_css_class(status),
            escape_html(status)
        );
    }
    html.push_str(
        "<div class=\"legend-item\"><span class=\"swatch status-untracked\"></span>Untracked Status</div>\n</div>\n",
    );
    html
}

/// Suggested color for an untracked status name.
fn suggested_color(status: &str) -> &'static str {
    let lower = status.trim().to_lowercase();
    SUGGESTIONS
        .iter()
        .find(|(name, _)| *name == lower)
        .or_else(|| SUGGESTIONS.iter().find(|(name, _)| lower.contains(name)))
        .map_or(DEFAULT_SUGGESTION, |(_, color)| color)
}

fn color_panel(timeline: &Timeline) -> String {
    let untracked: BTreeSet<&str> = timeline
        .issues
        .iter()
        .flat_map(|issue| issue.segments.iter())
        .filter(|segment| !segment.tracked)
        .map(|segment| segment.status.as_str())
        .collect();

    let mut html = String::from(
        "<button class=\"color-toggle\" onclick=\"toggleColorPanel()\">Colors</button>\n\
         <div class=\"color-panel\">\n<strong>Untracked status colors</strong>\n",
    );
    if untracked.is_empty() {
        html.push_str("<div>No untracked statuses in this report.</div>\n");
    }
    for status in untracked {
        let escaped = escape_html(status);
        let _ = writeln!(
            html,
            "<div class=\"color-row\"><span>{escaped}</span><input type=\"color\" data-status=\"{escaped}\" value=\"{}\"></div>",
            suggested_color(status).to_ascii_lowercase()
        );
    }
    html.push_str(
        "<div class=\"color-actions\">\
         <button onclick=\"applyStatusColors()\">Apply</button>\
         <button onclick=\"resetStatusColors()\">Reset</button>\
         <button onclick=\"exportStatusColors()\">Export</button>\
         <label>Import<input type=\"file\" accept=\".json\" onchange=\"importStatusColors(this)\"></label>\
         </div>\n</div>\n",
    );
    html
}

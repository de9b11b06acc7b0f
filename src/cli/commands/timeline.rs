//! `jm timeline`: build the HTML status timeline report.

use super::Session;
use crate::cli::TimelineArgs;
use crate::config::{TimelineConfig, TimelineConfigStore};
use crate::error::{JiraMetricsError, Result};
use crate::timeline::{build_timeline, render_html, validate_color};
use crate::util::time::parse_optional_date;
use crate::util::{ProgressSink, atomic_write, split_name_value};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Serialize)]
struct TimelineOutput<'a> {
    output: String,
    jql: &'a str,
    issues: usize,
    failed: &'a [String],
    statuses: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_config: Option<&'a str>,
}

/// # Errors
///
/// Returns an error for invalid statuses, colors or dates, a missing JQL,
/// an unknown saved configuration, or a failed search or write.
pub fn execute(args: &TimelineArgs, session: &Session) -> Result<()> {
    let store = session.paths.timeline_configs();
    let base = base_config(args, &store)?;
    let config = merge(args, base, session.optional_jql(&args.source)?)?;
    if config.jql.is_empty() {
        return Err(JiraMetricsError::MissingJql);
    }

    let start = parse_optional_date(non_empty(&config.start_date), "start")?;
    let end = parse_optional_date(non_empty(&config.end_date), "end")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(JiraMetricsError::validation(
                "end",
                "the end date must be after the start date",
            ));
        }
    }

    let client = session.client()?;
    let progress = session.progress();
    let timeline = build_timeline(
        &client,
        &config.jql,
        &config.status_order,
        start,
        end,
        &config.status_colors,
        session.settings.workers,
        &progress,
        Utc::now(),
    )?;
    progress.finish();

    let html = render_html(&timeline, &config.jql, non_empty(&config.project));
    atomic_write(&args.output, html.as_bytes())?;
    info!(path = %args.output.display(), issues = timeline.issues.len(), "Wrote timeline report");

    store.save_last(&config)?;
    if let Some(name) = &args.save_config {
        store.save(name, &config)?;
    }

    let out = &session.out;
    if out.is_json() {
        out.json(&TimelineOutput {
            output: args.output.display().to_string(),
            jql: &config.jql,
            issues: timeline.issues.len(),
            failed: &timeline.failed,
            statuses: timeline.ordered_statuses(),
            saved_config: args.save_config.as_deref(),
        });
        return Ok(());
    }

    if timeline.issues.is_empty() {
        out.warning("No issues entered a tracked status; the report has no data");
    }
    out.success(&format!(
        "Timeline for {} issue(s) written to {}",
        timeline.issues.len(),
        args.output.display()
    ));
    if !timeline.failed.is_empty() {
        out.warning(&format!(
            "Skipped {} issue(s) that failed to download: {}",
            timeline.failed.len(),
            timeline.failed.join(", ")
        ));
    }
    if let Some(name) = &args.save_config {
        out.info(&format!("Saved configuration '{name}'"));
    }
    Ok(())
}

fn base_config(args: &TimelineArgs, store: &TimelineConfigStore) -> Result<TimelineConfig> {
    if let Some(name) = &args.config {
        return store.load(name);
    }
    if args.last {
        return store.load_last()?.ok_or_else(|| {
            JiraMetricsError::Config("No timeline configuration has been used yet".to_string())
        });
    }
    Ok(TimelineConfig::default())
}

/// Command-line values win over the saved configuration.
fn merge(args: &TimelineArgs, mut config: TimelineConfig, jql: Option<String>) -> Result<TimelineConfig> {
    if let Some(project) = &args.project {
        config.project = project.trim().to_string();
    }

    match jql {
        Some(jql) => config.jql = jql,
        None if config.jql.trim().is_empty() && !config.project.is_empty() => {
            config.jql = project_jql(&config.project);
        }
        None => {}
    }
    config.jql = config.jql.trim().to_string();

    if !args.statuses.is_empty() {
        config.status_order = parse_statuses(&args.statuses)?;
    }

    let mut colors = BTreeMap::new();
    for (status, color) in &config.status_colors {
        colors.insert(status.clone(), validate_color(status, color)?);
    }
    for raw in &args.colors {
        let (status, color) = split_name_value(raw, "color")?;
        colors.insert(status.to_string(), validate_color(status, color)?);
    }
    config.status_colors = colors;

    if let Some(start) = &args.start {
        config.start_date = start.trim().to_string();
    }
    if let Some(end) = &args.end {
        config.end_date = end.trim().to_string();
    }
    debug!(statuses = config.status_order.len(), colors = config.status_colors.len(), "Merged timeline settings");
    Ok(config)
}

fn project_jql(project: &str) -> String {
    format!("project = \"{}\" ORDER BY created ASC", project.replace('"', "\\\""))
}

fn parse_statuses(raw: &[String]) -> Result<BTreeMap<String, i64>> {
    raw.iter()
        .map(|entry| {
            let (name, order) = split_name_value(entry, "status")?;
            let order = order.parse::<i64>().map_err(|_| {
                JiraMetricsError::validation("status", format!("order for '{name}' must be an integer"))
            })?;
            Ok((name.to_string(), order))
        })
        .collect()
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppPaths;
    use tempfile::TempDir;

    fn args() -> TimelineArgs {
        TimelineArgs {
            statuses: vec!["In Progress=1".to_string(), "Review=2".to_string()],
            ..TimelineArgs::default()
        }
    }

    #[test]
    fn test_parse_statuses() {
        let order = parse_statuses(&args().statuses).unwrap();
        assert_eq!(order.get("In Progress"), Some(&1));
        assert_eq!(order.get("Review"), Some(&2));
        assert!(parse_statuses(&["Done=last".to_string()]).is_err());
        assert!(parse_statuses(&["Done".to_string()]).is_err());
    }

    #[test]
    fn test_project_builds_jql_when_none_given() {
        let mut args = args();
        args.project = Some("OPS".to_string());
        let config = merge(&args, TimelineConfig::default(), None).unwrap();
        assert_eq!(config.jql, "project = \"OPS\" ORDER BY created ASC");
    }

    #[test]
    fn test_cli_values_override_saved_config() {
        let saved = TimelineConfig {
            jql: "project = OLD".to_string(),
            start_date: "2024-01-01".to_string(),
            status_order: BTreeMap::from([("Doing".to_string(), 1)]),
            status_colors: BTreeMap::from([("Doing".to_string(), "#aabbcc".to_string())]),
            ..TimelineConfig::default()
        };
        let mut args = args();
        args.colors = vec!["Review=#112233".to_string()];
        args.end = Some("2024-02-01".to_string());

        let config = merge(&args, saved, Some("project = NEW".to_string())).unwrap();
        assert_eq!(config.jql, "project = NEW");
        assert_eq!(config.start_date, "2024-01-01");
        assert_eq!(config.end_date, "2024-02-01");
        assert_eq!(config.status_order.len(), 2);
        assert_eq!(config.status_colors.get("Doing").map(String::as_str), Some("#AABBCC"));
        assert_eq!(config.status_colors.get("Review").map(String::as_str), Some("#112233"));
    }

    #[test]
    fn test_invalid_color_is_rejected() {
        let mut args = args();
        args.colors = vec!["Review=red".to_string()];
        assert!(matches!(
            merge(&args, TimelineConfig::default(), None),
            Err(JiraMetricsError::InvalidColor { .. })
        ));
    }

    #[test]
    fn test_last_without_history_is_an_error() {
        let temp = TempDir::new().unwrap();
        let store = AppPaths::at(temp.path()).timeline_configs();
        let args = TimelineArgs {
            last: true,
            ..TimelineArgs::default()
        };
        assert!(base_config(&args, &store).is_err());

        store.save_last(&TimelineConfig {
            jql: "project = A".to_string(),
            ..TimelineConfig::default()
        })
        .unwrap();
        assert_eq!(base_config(&args, &store).unwrap().jql, "project = A");
    }
}

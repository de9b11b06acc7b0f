//! `jm sprint`: status transitions inside a sprint window, as CSV.

use super::Session;
use crate::cli::SprintArgs;
use crate::error::{JiraMetricsError, Result};
use crate::sprint::{SprintReport, analyze_sprint, analyze_sprint_by_id};
use crate::util::ProgressSink;
use crate::util::time::to_iso;
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct SprintSummary<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    start: String,
    end: String,
    duration_days: i64,
    transitions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a SprintReport>,
}

/// # Errors
///
/// Returns an error when neither a sprint id nor JQL with both dates is
/// given, for invalid dates, or when the sprint cannot be analyzed.
pub fn execute(args: &SprintArgs, session: &Session) -> Result<()> {
    let client = session.client()?;
    let progress = session.progress();

    let report = if let Some(id) = args.sprint_id {
        analyze_sprint_by_id(&client, id, &progress)?
    } else {
        let jql = session.resolve_jql(&args.source)?;
        let (Some(start), Some(end)) = (&args.start, &args.end) else {
            return Err(JiraMetricsError::validation(
                "sprint",
                "give --sprint-id, or --start and --end with the JQL",
            ));
        };
        analyze_sprint(&client, &jql, start, end, session.settings.workers, &progress)?
    };
    progress.finish();

    if let Some(path) = &args.output {
        report.write_to(path)?;
        info!(path = %path.display(), rows = report.rows.len(), "Wrote sprint report");
    }

    let out = &session.out;
    if out.is_json() {
        out.json(&SprintSummary {
            output: args.output.as_ref().map(|p| p.display().to_string()),
            start: to_iso(&report.window.start),
            end: to_iso(&report.window.end),
            duration_days: report.window.duration_days(),
            transitions: report.rows.len(),
            report: args.output.is_none().then_some(&report),
        });
        return Ok(());
    }

    match &args.output {
        Some(path) => out.success(&format!(
            "{} transition(s) in a {}-day sprint written to {}",
            report.rows.len(),
            report.window.duration_days(),
            path.display()
        )),
        None => out.raw(&report.to_csv_string()),
    }
    Ok(())
}

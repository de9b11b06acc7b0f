//! `jm export csv` and `jm export json`.

use super::profile::apply_args;
use super::{Session, ensure_writable, field_catalog};
use crate::cli::{ExportCommands, ExportCsvArgs, ExportJsonArgs};
use crate::config::ExportProfile;
use crate::error::{JiraMetricsError, Result};
use crate::export::{export_csv, export_json};
use crate::model::FieldCatalog;
use crate::util::ProgressSink;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

/// # Errors
///
/// Returns an error if the JQL, profile or connection settings are unusable,
/// or the key search fails.
pub fn execute(command: &ExportCommands, session: &Session) -> Result<()> {
    match command {
        ExportCommands::Csv(args) => csv(args, session),
        ExportCommands::Json(args) => json(args, session),
    }
}

#[derive(Serialize)]
struct CsvOutput<'a> {
    output: Option<String>,
    rows: usize,
    columns: &'a [String],
    failed: &'a [String],
}

fn csv(args: &ExportCsvArgs, session: &Session) -> Result<()> {
    let jql = session.resolve_jql(&args.source)?;
    if let Some(path) = &args.output {
        ensure_writable(path, args.force)?;
    }

    let mut profile = match &args.profile {
        Some(name) => session.paths.profiles().load(name)?,
        None => ExportProfile {
            name: "adhoc".to_string(),
            ..ExportProfile::default()
        },
    };
    apply_args(&mut profile, &args.inline)?;

    let client = session.client()?;
    let catalog = field_catalog(&client)?;
    let unresolved = resolve_fields(&mut profile, &catalog);
    for field in &unresolved {
        warn!(field = %field, "Unknown field; exporting it as an id");
        session
            .out
            .warning(&format!("Field '{field}' is not in the field catalog"));
    }

    let progress = session.progress();
    let export = export_csv(
        &client,
        &jql,
        &profile,
        &catalog,
        session.settings.workers,
        &progress,
        Utc::now(),
    )?;
    progress.finish();

    let out = &session.out;
    match &args.output {
        Some(path) => {
            export.write_to(path)?;
            info!(path = %path.display(), rows = export.rows.len(), "Wrote CSV export");
            if out.is_json() {
                out.json(&CsvOutput {
                    output: Some(path.display().to_string()),
                    rows: export.rows.len(),
                    columns: &export.headers,
                    failed: &export.failed,
                });
            } else {
                out.success(&format!(
                    "Exported {} issue(s) to {}",
                    export.rows.len(),
                    path.display()
                ));
            }
        }
        None if out.is_json() => out.json(&CsvOutput {
            output: None,
            rows: export.rows.len(),
            columns: &export.headers,
            failed: &export.failed,
        }),
        None => out.raw(&export.to_csv_string()),
    }

    if !export.failed.is_empty() {
        out.warning(&format!(
            "{} issue(s) could not be downloaded: {}",
            export.failed.len(),
            export.failed.join(", ")
        ));
    }
    Ok(())
}

/// Map every selected field (id or display name) to a field id.
///
/// Returns the entries that matched neither; they are kept unchanged.
fn resolve_fields(profile: &mut ExportProfile, catalog: &FieldCatalog) -> Vec<String> {
    if profile.selected_field_ids.is_empty() {
        profile.selected_field_ids = profile.selected_field_names.clone();
    }

    let mut unresolved = Vec::new();
    let mut resolved: Vec<String> = Vec::with_capacity(profile.selected_field_ids.len());
    for field in &profile.selected_field_ids {
        let id = if catalog.contains_id(field) {
            field.clone()
        } else if let Some(id) = catalog.id_for_name(field) {
            id.to_string()
        } else {
            unresolved.push(field.clone());
            field.clone()
        };
        if !resolved.contains(&id) {
            resolved.push(id);
        }
    }
    profile.selected_field_ids = resolved;
    unresolved
}

fn json(args: &ExportJsonArgs, session: &Session) -> Result<()> {
    let jql = session.resolve_jql(&args.source)?;
    if args.dir.is_file() {
        return Err(JiraMetricsError::validation(
            "dir",
            format!("{} is a file", args.dir.display()),
        ));
    }

    let client = session.client()?;
    let catalog = field_catalog(&client)?;
    let progress = session.progress();
    let summary = export_json(
        &client,
        &jql,
        &catalog,
        &args.dir,
        session.settings.workers,
        &progress,
    )?;
    progress.finish();

    let out = &session.out;
    if out.is_json() {
        out.json(&summary);
        return Ok(());
    }
    out.success(&format!(
        "Exported {} issue(s) to {}",
        summary.written.len(),
        summary.dir.display()
    ));
    for failure in &summary.failed {
        out.warning(&format!("{}: {}", failure.key, failure.error));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldDef;

    fn catalog() -> FieldCatalog {
        FieldCatalog::from_defs(&[
            FieldDef {
                id: "summary".to_string(),
                name: "Summary".to_string(),
                custom: false,
            },
            FieldDef {
                id: "customfield_10016".to_string(),
                name: "Story Points".to_string(),
                custom: true,
            },
        ])
    }

    #[test]
    fn test_resolve_fields_accepts_ids_and_names() {
        let mut profile = ExportProfile {
            selected_field_ids: vec![
                "summary".to_string(),
                "Story Points".to_string(),
                "customfield_10016".to_string(),
                "Team".to_string(),
            ],
            ..ExportProfile::default()
        };
        let unresolved = resolve_fields(&mut profile, &catalog());
        assert_eq!(
            profile.selected_field_ids,
            vec!["summary", "customfield_10016", "Team"]
        );
        assert_eq!(unresolved, vec!["Team"]);
    }

    #[test]
    fn test_resolve_fields_falls_back_to_names() {
        let mut profile = ExportProfile {
            selected_field_names: vec!["Story Points".to_string()],
            ..ExportProfile::default()
        };
        assert!(resolve_fields(&mut profile, &catalog()).is_empty());
        assert_eq!(profile.selected_field_ids, vec!["customfield_10016"]);
    }
}

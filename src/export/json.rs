//! Per-issue JSON and Markdown export.

use super::KEY_PAGE_SIZE;
use crate::client::JiraApi;
use crate::error::Result;
use crate::format::{AdfOptions, issue_markdown, normalize_to_markdown};
use crate::model::{FieldCatalog, Issue};
use crate::util::{ProgressSink, atomic_write, fetch_all};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const STAGE: &str = "Exporting JSON...";

/// Outcome of a JSON export run.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct JsonExportSummary {
    pub dir: PathBuf,
    pub written: Vec<String>,
    pub failed: Vec<FailedIssue>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailedIssue {
    pub key: String,
    pub error: String,
}

/// Write `<KEY>.json` and `<KEY>.md` into `dir` for every issue matched by `jql`.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the key search
/// fails. Individual issue failures are logged and listed in the summary.
pub fn export_json(
    api: &dyn JiraApi,
    jql: &str,
    catalog: &FieldCatalog,
    dir: &Path,
    workers: usize,
    progress: &dyn ProgressSink,
) -> Result<JsonExportSummary> {
    fs::create_dir_all(dir)?;
    let search = api.search_keys(jql, KEY_PAGE_SIZE)?;
    info!(jql, count = search.keys.len(), dir = %dir.display(), "Exporting JSON");

    let outcomes = fetch_all(&search.keys, workers, STAGE, progress, |key| {
        export_one(api, key, catalog, dir)
    })?;

    let mut summary = JsonExportSummary {
        dir: dir.to_path_buf(),
        ..JsonExportSummary::default()
    };
    for (key, outcome) in outcomes {
        match outcome {
            Ok(()) => summary.written.push(key),
            Err(err) => {
                warn!(key = %key, error = %err, "Issue export failed");
                summary.failed.push(FailedIssue {
                    key,
                    error: err.to_string(),
                });
            }
        }
    }
    Ok(summary)
}

fn export_one(api: &dyn JiraApi, key: &str, catalog: &FieldCatalog, dir: &Path) -> Result<()> {
    let mut issue = api.get_issue(key, true)?;
    refill_comments(api, key, &mut issue)?;

    let description = issue.fields.get("description").cloned().unwrap_or(Value::Null);
    let description_md = normalize_to_markdown(&description, &AdfOptions::for_description());

    let document = export_document(&issue, catalog, &description, &description_md);
    let json = serde_json::to_string_pretty(&document)?;
    atomic_write(&dir.join(format!("{key}.json")), json.as_bytes())?;

    let markdown = issue_markdown(&issue.fields, &description_md);
    atomic_write(&dir.join(format!("{key}.md")), markdown.as_bytes())?;

    debug!(key, "Exported issue");
    Ok(())
}

/// Replace a missing or truncated embedded comment block with the full list.
fn refill_comments(api: &dyn JiraApi, key: &str, issue: &mut Issue) -> Result<()> {
    let block = issue.fields.get("comment").filter(|block| !block.is_null());
    let embedded = block
        .and_then(|block| block.get("comments"))
        .and_then(Value::as_array)
        .map_or(0, Vec::len) as u64;
    let reported = block.and_then(|block| block.get("total")).and_then(Value::as_u64);

    let complete = matches!(reported, Some(total) if total <= embedded);
    if complete {
        return Ok(());
    }

    let comments = api.get_all_comments(key)?;
    let count = comments.len();
    debug!(key, count, "Refilled comments");
    issue.fields.insert(
        "comment".to_string(),
        json!({
            "comments": comments,
            "total": count,
            "maxResults": count,
            "startAt": 0,
            "self": format!("{}/rest/api/3/issue/{key}/comment", api.base_url()),
        }),
    );
    Ok(())
}

/// The exported JSON: fields keyed by display name, description split in two.
fn export_document(
    issue: &Issue,
    catalog: &FieldCatalog,
    description: &Value,
    description_md: &str,
) -> Value {
    let mut fields = Map::new();
    for (id, value) in &issue.fields {
        if id == "description" {
            fields.insert("description_raw".to_string(), description.clone());
            fields.insert(
                "description_markdown".to_string(),
                Value::String(description_md.to_string()),
            );
        } else {
            fields.insert(catalog.display_name(id).to_string(), value.clone());
        }
    }

    json!({
        "key": issue.key,
        "id": issue.id,
        "self": issue.self_url,
        "fields": fields,
        "changelog": issue.changelog,
        "meta": {
            "fieldIdMap": catalog.to_field_id_map(),
        },
    })
}

//! Per-issue Markdown document written next to each JSON export.

use super::adf::{AdfOptions, normalize_to_markdown};
use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};

/// Build the Markdown document for one issue.
///
/// `fields` are the raw (id-keyed) fields; `description_md` is the already
/// converted description.
#[must_use]
pub fn issue_markdown(fields: &Map<String, Value>, description_md: &str) -> String {
    let mut lines: Vec<String> = Vec::new();

    let summary = fields
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or("No Summary");
    lines.push(format!("# {summary}"));
    lines.push(String::new());

    lines.push("# Description".to_string());
    lines.push(String::new());
    let description = description_md.replace("\\n", "\n");
    let description = description.trim();
    if description.is_empty() {
        lines.push("_No description provided_".to_string());
    } else {
        lines.push(description.to_string());
    }
    lines.push(String::new());

    lines.push("# Related Work Items".to_string());
    lines.push(String::new());
    let related = related_items(fields);
    if related.is_empty() {
        lines.push("_No related work items found_".to_string());
    } else {
        lines.extend(related);
    }
    lines.push(String::new());

    let comments = fields
        .get("comment")
        .and_then(|block| block.get("comments"))
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice);
    if !comments.is_empty() {
        lines.push("# Comments".to_string());
        lines.push(String::new());
        let options = AdfOptions::for_comments();
        for comment in comments {
            lines.push(comment_header(comment));
            lines.push(String::new());
            let body = comment.get("body").unwrap_or(&Value::Null);
            let rendered = normalize_to_markdown(body, &options).replace("\\n", "\n");
            let rendered = rendered.trim();
            if rendered.is_empty() {
                lines.push("_No comment body_".to_string());
            } else {
                lines.push(rendered.to_string());
            }
            lines.push(String::new());
        }
    }

    lines.join("\n")
}

fn text_at<'a>(value: &'a Value, path: &[&str]) -> &'a str {
    path.iter()
        .try_fold(value, |current, key| current.get(*key))
        .and_then(Value::as_str)
        .unwrap_or("")
}

fn related_items(fields: &Map<String, Value>) -> Vec<String> {
    let mut items = Vec::new();

    for subtask in fields
        .get("subtasks")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let key = text_at(subtask, &["key"]);
        if !key.is_empty() {
            items.push(format!(
                "- **Subtask**: [{key}] {} ({})",
                text_at(subtask, &["fields", "summary"]),
                text_at(subtask, &["fields", "status", "name"]),
            ));
        }
    }

    if let Some(parent) = fields.get("parent").filter(|p| !p.is_null()) {
        let key = text_at(parent, &["key"]);
        if !key.is_empty() {
            items.push(format!(
                "- **Parent**: [{key}] {}",
                text_at(parent, &["fields", "summary"])
            ));
        }
    }

    for link in fields
        .get("issuelinks")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let (related, direction_key) = if let Some(inward) = link.get("inwardIssue") {
            (inward, "inward")
        } else if let Some(outward) = link.get("outwardIssue") {
            (outward, "outward")
        } else {
            continue;
        };
        let direction = link
            .get("type")
            .and_then(|kind| kind.get(direction_key))
            .and_then(Value::as_str)
            .unwrap_or("relates to");
        let key = text_at(related, &["key"]);
        if !key.is_empty() {
            items.push(format!(
                "- **{}**: [{key}] {} ({})",
                title_case(direction),
                text_at(related, &["fields", "summary"]),
                text_at(related, &["fields", "status", "name"]),
            ));
        }
    }

    let epic = ["customfield_10014", "epic link", "Epic Link"]
        .iter()
        .find_map(|id| fields.get(*id).filter(|value| is_truthy(value)));
    match epic {
        Some(Value::String(epic)) if !epic.trim().is_empty() => {
            items.push(format!("- **Epic**: {epic}"));
        }
        Some(epic @ Value::Object(_)) => {
            let key = text_at(epic, &["key"]);
            if !key.is_empty() {
                items.push(format!(
                    "- **Epic**: [{key}] {}",
                    text_at(epic, &["fields", "summary"])
                ));
            }
        }
        _ => {}
    }

    let issue_type = fields
        .get("issuetype")
        .map_or("", |kind| text_at(kind, &["name"]));
    if issue_type.eq_ignore_ascii_case("epic") {
        items.push("- **Type**: This is an Epic (child issues not listed)".to_string());
    }

    items
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

fn comment_header(comment: &Value) -> String {
    let author = comment.get("author").unwrap_or(&Value::Null);
    let name = ["displayName", "name", "accountId"]
        .iter()
        .map(|key| text_at(author, &[*key]))
        .find(|name| !name.is_empty())
        .unwrap_or("Unknown Author");

    let created = text_at(comment, &["created"]);
    match parse_with_offset(created) {
        Some(dt) => format!("## {name} | {} | {}", dt.format("%Y-%m-%d"), dt.format("%H:%M")),
        None => format!("## {name} | Unknown Date | Unknown Time"),
    }
}

fn parse_with_offset(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
}

/// Capitalise the first letter of each word and lowercase the rest.
#[must_use]
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

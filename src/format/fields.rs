//! Flatten Jira field values into single CSV cells.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static SPRINT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"name=([^,\]]+)").expect("valid sprint regex"));

/// Render a field value as text. `display_name` selects special cases for
/// sprints, versions and components.
#[must_use]
pub fn format_field_value(display_name: &str, value: &Value) -> String {
    let lowered = display_name.to_lowercase();

    if let Value::Array(items) = value {
        match lowered.as_str() {
            "sprint" => return format_sprints(items),
            "fix versions" | "affects versions" | "components" => {
                return items
                    .iter()
                    .filter_map(|item| item.get("name").and_then(Value::as_str))
                    .filter(|name| !name.is_empty())
                    .collect::<Vec<_>>()
                    .join(", ");
            }
            _ => {
                return items
                    .iter()
                    .map(|item| match item {
                        Value::Object(_) => labelled(item).unwrap_or_else(|| item.to_string()),
                        other => scalar_text(other),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
            }
        }
    }

    match value {
        Value::Object(_) => labelled(value).unwrap_or_else(|| value.to_string()),
        other => scalar_text(other),
    }
}

/// First of `displayName`, `name`, `value`, `key` that is present.
fn labelled(value: &Value) -> Option<String> {
    ["displayName", "name", "value", "key"]
        .iter()
        .find_map(|key| value.get(*key))
        .map(scalar_text)
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn format_sprints(items: &[Value]) -> String {
    items
        .iter()
        .map(|sprint| match sprint {
            Value::Object(_) => {
                let name = sprint
                    .get("name")
                    .filter(|name| !is_blank(name))
                    .or_else(|| sprint.get("id"))
                    .map(scalar_text)
                    .unwrap_or_default();
                match sprint.get("state").and_then(Value::as_str) {
                    Some(state) if !state.is_empty() => format!("{name} ({state})"),
                    _ => name,
                }
            }
            other => {
                let raw = scalar_text(other);
                SPRINT_NAME
                    .captures(&raw)
                    .and_then(|caps| caps.get(1))
                    .map_or_else(|| raw.clone(), |m| m.as_str().to_string())
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

//! Core data types for `jira_metrics`.
//!
//! Issues are kept close to the JSON Jira returns. Fields stay a JSON map and
//! unknown keys are captured in `extra`, so a JSON export writes back what the
//! API sent apart from the documented transformations.

use crate::util::time::parse_jira_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A Jira issue as returned by `GET /rest/api/3/issue/{key}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    #[serde(default)]
    pub id: String,
    pub key: String,
    #[serde(rename = "self", default)]
    pub self_url: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<Changelog>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `changelog` block of an issue fetched with `expand=changelog`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Changelog {
    #[serde(default)]
    pub histories: Vec<History>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One changelog entry: who changed what, when.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct History {
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub items: Vec<ChangeItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single field change inside a history entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChangeItem {
    #[serde(default)]
    pub field: String,
    #[serde(rename = "fromString", default)]
    pub from_name: Option<String>,
    #[serde(rename = "toString", default)]
    pub to_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl History {
    /// Parsed `created` timestamp.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_jira_timestamp(&self.created)
    }
}

/// A status transition pulled out of the changelog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub from: Option<String>,
    pub to: Option<String>,
    pub at: DateTime<Utc>,
}

impl Issue {
    /// Raw field value by id.
    #[must_use]
    pub fn field(&self, id: &str) -> Option<&Value> {
        self.fields.get(id).filter(|value| !value.is_null())
    }

    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.field("summary").and_then(Value::as_str)
    }

    /// Current status name (`fields.status.name`).
    #[must_use]
    pub fn status_name(&self) -> Option<&str> {
        self.field("status")
            .and_then(|status| status.get("name"))
            .and_then(Value::as_str)
    }

    #[must_use]
    pub fn issue_type_name(&self) -> Option<&str> {
        self.field("issuetype")
            .and_then(|kind| kind.get("name"))
            .and_then(Value::as_str)
    }

    /// Parsed `fields.created`.
    #[must_use]
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.field("created")
            .and_then(Value::as_str)
            .and_then(parse_jira_timestamp)
    }

    /// Comments embedded under `fields.comment.comments`.
    #[must_use]
    pub fn comments(&self) -> &[Value] {
        self.field("comment")
            .and_then(|block| block.get("comments"))
            .and_then(Value::as_array)
            .map_or(&[], Vec::as_slice)
    }

    /// Changelog histories, empty when the issue was fetched without them.
    #[must_use]
    pub fn histories(&self) -> &[History] {
        self.changelog
            .as_ref()
            .map_or(&[], |changelog| changelog.histories.as_slice())
    }
}

/// Field definition from `GET /rest/api/3/field`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub custom: bool,
}

/// Field id to display name lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldCatalog {
    names: BTreeMap<String, String>,
}

impl FieldCatalog {
    #[must_use]
    pub fn from_defs(defs: &[FieldDef]) -> Self {
        let names = defs
            .iter()
            .filter(|def| !def.id.is_empty())
            .map(|def| {
                let name = if def.name.is_empty() {
                    def.id.clone()
                } else {
                    def.name.clone()
                };
                (def.id.clone(), name)
            })
            .collect();
        Self { names }
    }

    /// Display name for a field id, falling back to the id itself.
    #[must_use]
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.names.get(id).map_or(id, String::as_str)
    }

    #[must_use]
    pub fn contains_id(&self, id: &str) -> bool {
        self.names.contains_key(id)
    }

    /// Reverse lookup, used when a profile only stored display names.
    #[must_use]
    pub fn id_for_name(&self, name: &str) -> Option<&str> {
        self.names
            .iter()
            .find(|(_, display)| display.as_str() == name)
            .map(|(id, _)| id.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The `meta.fieldIdMap` object written into JSON exports.
    #[must_use]
    pub fn to_field_id_map(&self) -> Map<String, Value> {
        self.names
            .iter()
            .map(|(id, name)| (id.clone(), Value::String(name.clone())))
            .collect()
    }
}

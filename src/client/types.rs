//! Wire types for the Jira REST and Agile APIs.

use crate::model::Issue;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Issue keys matched by a JQL search, in server order.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SearchResult {
    pub keys: Vec<String>,
    pub total: u64,
}

/// Body of `POST /rest/api/3/search`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchRequest<'a> {
    pub jql: &'a str,
    pub start_at: u64,
    pub max_results: u64,
    pub fields: &'a [&'a str],
    pub expand: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchPage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub issues: Vec<KeyOnly>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KeyOnly {
    pub key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommentPage {
    #[serde(default)]
    pub comments: Vec<Value>,
    #[serde(default)]
    pub max_results: u64,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SprintIssuePage {
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssueTypeStatuses {
    #[serde(default)]
    pub statuses: Vec<NamedStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NamedStatus {
    #[serde(default)]
    pub name: String,
}

/// Project from `GET /rest/api/3/project`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    #[serde(default)]
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub name: String,
}

/// Sprint from `GET /rest/agile/1.0/sprint/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sprint {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

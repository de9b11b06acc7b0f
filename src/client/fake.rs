//! In-memory [`JiraApi`] used by unit tests.

use super::{JiraApi, SearchResult, Sprint};
use crate::error::{JiraMetricsError, Result};
use crate::model::Issue;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct FakeJira {
    keys: Vec<String>,
    issues: HashMap<String, Issue>,
    comments: HashMap<String, Vec<Value>>,
    sprints: HashMap<u64, (Sprint, Vec<Issue>)>,
    failing: HashSet<String>,
}

impl FakeJira {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an issue from raw JSON; it is returned by every search.
    pub fn with_issue(mut self, raw: Value) -> Self {
        let issue: Issue = serde_json::from_value(raw).expect("fixture issue");
        self.keys.push(issue.key.clone());
        self.issues.insert(issue.key.clone(), issue);
        self
    }

    /// A key that searches return but whose download fails.
    pub fn with_failing(mut self, key: &str) -> Self {
        self.keys.push(key.to_string());
        self.failing.insert(key.to_string());
        self
    }

    pub fn with_comments(mut self, key: &str, comments: Vec<Value>) -> Self {
        self.comments.insert(key.to_string(), comments);
        self
    }

    pub fn with_sprint(mut self, sprint: Value, issues: Vec<Value>) -> Self {
        let sprint: Sprint = serde_json::from_value(sprint).expect("fixture sprint");
        let issues = issues
            .into_iter()
            .map(|raw| serde_json::from_value(raw).expect("fixture issue"))
            .collect();
        self.sprints.insert(sprint.id, (sprint, issues));
        self
    }

    fn not_found(what: &str) -> JiraMetricsError {
        JiraMetricsError::Api {
            status: 404,
            url: format!("https://fake.atlassian.net/{what}"),
            message: "not found".to_string(),
        }
    }
}

impl JiraApi for FakeJira {
    fn base_url(&self) -> &str {
        "https://fake.atlassian.net"
    }

    fn search_keys(&self, _jql: &str, _page_size: u64) -> Result<SearchResult> {
        Ok(SearchResult {
            keys: self.keys.clone(),
            total: self.keys.len() as u64,
        })
    }

    fn get_issue(&self, key: &str, _expand_changelog: bool) -> Result<Issue> {
        if self.failing.contains(key) {
            return Err(JiraMetricsError::Api {
                status: 500,
                url: format!("https://fake.atlassian.net/rest/api/3/issue/{key}"),
                message: "boom".to_string(),
            });
        }
        self.issues
            .get(key)
            .cloned()
            .ok_or_else(|| Self::not_found(key))
    }

    fn get_all_comments(&self, key: &str) -> Result<Vec<Value>> {
        Ok(self.comments.get(key).cloned().unwrap_or_default())
    }

    fn get_sprint(&self, id: u64) -> Result<Sprint> {
        self.sprints
            .get(&id)
            .map(|(sprint, _)| sprint.clone())
            .ok_or_else(|| Self::not_found(&format!("sprint/{id}")))
    }

    fn get_sprint_issues(&self, id: u64) -> Result<Vec<Issue>> {
        self.sprints
            .get(&id)
            .map(|(_, issues)| issues.clone())
            .ok_or_else(|| Self::not_found(&format!("sprint/{id}/issue")))
    }
}

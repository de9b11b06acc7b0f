//! Jira Cloud REST client.
//!
//! [`JiraClient`] wraps a blocking `reqwest` client with basic auth (email +
//! API token). Exporters and report builders depend on the [`JiraApi`] trait
//! instead, so they can run against in-memory fixtures in tests.

#[cfg(test)]
pub(crate) mod fake;
mod types;

pub use types::{Project, SearchResult, Sprint};

use crate::error::{JiraMetricsError, Result};
use crate::model::{FieldDef, Issue};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::RETRY_AFTER;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};
use types::{CommentPage, IssueTypeStatuses, SearchPage, SearchRequest, SprintIssuePage};

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(15);
const FIELDS_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RETRY_AFTER_SECS: u64 = 2;
const COMMENT_PAGE_SIZE: u64 = 100;
const SPRINT_PAGE_SIZE: u64 = 50;
const MAX_ERROR_BODY: usize = 500;

/// The operations the exporters and report builders need from Jira.
pub trait JiraApi: Sync {
    /// Base URL without a trailing slash.
    fn base_url(&self) -> &str;

    /// Keys matched by `jql`, fetched `page_size` at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    fn search_keys(&self, jql: &str, page_size: u64) -> Result<SearchResult>;

    /// # Errors
    ///
    /// Returns an error if the request fails or the issue cannot be decoded.
    fn get_issue(&self, key: &str, expand_changelog: bool) -> Result<Issue>;

    /// Every comment on an issue, following pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    fn get_all_comments(&self, key: &str) -> Result<Vec<Value>>;

    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn get_sprint(&self, id: u64) -> Result<Sprint>;

    /// Issues in a sprint, with changelog.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    fn get_sprint_issues(&self, id: u64) -> Result<Vec<Issue>>;
}

/// Blocking Jira REST client.
#[derive(Debug, Clone)]
pub struct JiraClient {
    base_url: String,
    email: String,
    token: String,
    http: Client,
}

impl JiraClient {
    /// Build a client. A trailing `/` on `base_url` is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, email: &str, token: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("jira_metrics/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            email: email.to_string(),
            token: token.to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.basic_auth(&self.email, Some(&self.token))
    }

    /// Send a request, retrying once after a 429.
    fn send(&self, build: impl Fn() -> RequestBuilder) -> Result<Response> {
        let response = build().send()?;
        if response.status() != StatusCode::TOO_MANY_REQUESTS {
            return Ok(response);
        }

        let wait = retry_after_secs(&response);
        warn!(url = %response.url(), wait_secs = wait, "Rate limited by Jira, retrying once");
        thread::sleep(Duration::from_secs(wait));
        Ok(build().send()?)
    }

    fn checked(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().to_string();
        let body = response.text().unwrap_or_default();
        Err(JiraMetricsError::Api {
            status: status.as_u16(),
            url,
            message: truncate_body(&body),
        })
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        timeout: Option<Duration>,
    ) -> Result<T> {
        let url = self.url(path);
        debug!(%url, ?query, "GET");
        let response = self.send(|| {
            let mut builder = self.authed(self.http.get(&url)).query(query);
            if let Some(timeout) = timeout {
                builder = builder.timeout(timeout);
            }
            builder
        })?;
        Ok(Self::checked(response)?.json()?)
    }

    /// `GET /rest/api/3/myself` returns 200. Network failures count as false.
    #[must_use]
    pub fn test_connection(&self) -> bool {
        let url = self.url("/rest/api/3/myself");
        match self
            .authed(self.http.get(&url))
            .timeout(CONNECTION_TIMEOUT)
            .send()
        {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                debug!(error = %e, "Connection test failed");
                false
            }
        }
    }

    /// The authenticated user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub fn myself(&self) -> Result<Value> {
        self.get_json("/rest/api/3/myself", &[], Some(CONNECTION_TIMEOUT))
    }

    /// All field definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub fn get_fields(&self) -> Result<Vec<FieldDef>> {
        self.get_json("/rest/api/3/field", &[], Some(FIELDS_TIMEOUT))
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub fn get_all_projects(&self) -> Result<Vec<Project>> {
        self.get_json("/rest/api/3/project", &[], None)
    }

    /// Status names used by a project, de-duplicated in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub fn get_project_statuses(&self, project_key: &str) -> Result<Vec<String>> {
        let per_type: Vec<IssueTypeStatuses> = self.get_json(
            &format!("/rest/api/3/project/{project_key}/statuses"),
            &[],
            None,
        )?;
        Ok(dedupe_status_names(&per_type))
    }

    /// Run a JQL search, following `startAt` pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    pub fn search_jql(
        &self,
        jql: &str,
        page_size: u64,
        fields: &[&str],
        expand_changelog: bool,
    ) -> Result<SearchResult> {
        let url = self.url("/rest/api/3/search");
        let page_size = page_size.max(1);
        let mut start_at = 0;
        let mut result = SearchResult::default();

        loop {
            let body = SearchRequest {
                jql,
                start_at,
                max_results: page_size,
                fields,
                expand: if expand_changelog {
                    vec!["changelog"]
                } else {
                    Vec::new()
                },
            };
            debug!(%url, start_at, page_size, "POST search");
            let response = self.send(|| self.authed(self.http.post(&url)).json(&body))?;
            let page: SearchPage = Self::checked(response)?.json()?;

            result.total = page.total;
            let received = page.issues.len();
            result.keys.extend(page.issues.into_iter().map(|issue| issue.key));

            start_at += page_size;
            if start_at >= result.total || received == 0 {
                break;
            }
        }

        info!(jql, total = result.total, fetched = result.keys.len(), "Search complete");
        Ok(result)
    }
}

impl JiraApi for JiraClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn search_keys(&self, jql: &str, page_size: u64) -> Result<SearchResult> {
        self.search_jql(jql, page_size, &["key"], false)
    }

    fn get_issue(&self, key: &str, expand_changelog: bool) -> Result<Issue> {
        let query: Vec<(&str, String)> = if expand_changelog {
            vec![("expand", "changelog".to_string())]
        } else {
            Vec::new()
        };
        self.get_json(&format!("/rest/api/3/issue/{key}"), &query, None)
    }

    fn get_all_comments(&self, key: &str) -> Result<Vec<Value>> {
        let path = format!("/rest/api/3/issue/{key}/comment");
        let mut start_at = 0;
        let mut comments = Vec::new();

        loop {
            let page: CommentPage = self.get_json(
                &path,
                &[
                    ("startAt", start_at.to_string()),
                    ("maxResults", COMMENT_PAGE_SIZE.to_string()),
                ],
                None,
            )?;
            let received = page.comments.len();
            comments.extend(page.comments);

            let step = page.max_results.max(received as u64);
            if start_at + step >= page.total || received == 0 {
                break;
            }
            start_at += step;
        }

        debug!(key, count = comments.len(), "Fetched comments");
        Ok(comments)
    }

    fn get_sprint(&self, id: u64) -> Result<Sprint> {
        self.get_json(&format!("/rest/agile/1.0/sprint/{id}"), &[], None)
    }

    fn get_sprint_issues(&self, id: u64) -> Result<Vec<Issue>> {
        let path = format!("/rest/agile/1.0/sprint/{id}/issue");
        let mut start_at = 0;
        let mut issues = Vec::new();

        loop {
            let page: SprintIssuePage = self.get_json(
                &path,
                &[
                    ("expand", "changelog".to_string()),
                    ("startAt", start_at.to_string()),
                    ("maxResults", SPRINT_PAGE_SIZE.to_string()),
                ],
                None,
            )?;
            let received = page.issues.len() as u64;
            issues.extend(page.issues);
            start_at += received;

            if received == 0 || start_at >= page.total {
                break;
            }
        }

        debug!(sprint = id, count = issues.len(), "Fetched sprint issues");
        Ok(issues)
    }
}

/// Seconds to wait after a 429: `Retry-After` clamped to 1..=10, default 2.
fn retry_after_secs(response: &Response) -> u64 {
    parse_retry_after(
        response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok()),
    )
}

fn parse_retry_after(raw: Option<&str>) -> u64 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .map_or(DEFAULT_RETRY_AFTER_SECS, |secs| secs.clamp(1, 10) as u64)
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(MAX_ERROR_BODY).collect();
    cut.push_str("...");
    cut
}

fn dedupe_status_names(per_type: &[IssueTypeStatuses]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for status in per_type.iter().flat_map(|entry| entry.statuses.iter()) {
        if !status.name.is_empty() && !names.contains(&status.name) {
            names.push(status.name.clone());
        }
    }
    names
}

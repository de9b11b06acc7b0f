//! Structured error output for scripted callers.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Retryability flags
//! - Context for debugging

use crate::error::JiraMetricsError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
/// Format: `SCREAMING_SNAKE_CASE` for easy parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Jira Errors (exit code 2) ===
    /// Network or transport failure
    HttpError,
    /// Non-success API response
    ApiError,
    /// Jira returned 429 even after a retry
    RateLimited,
    /// Credentials rejected
    AuthFailed,
    /// Credentials missing
    NotAuthenticated,

    // === Saved Item Errors (exit code 3) ===
    /// Saved query not found
    QueryNotFound,
    /// Saved query already exists
    QueryExists,
    /// Export profile not found
    ProfileNotFound,
    /// Timeline config not found
    TimelineConfigNotFound,

    // === Validation Errors (exit code 4) ===
    /// Field validation failed
    ValidationFailed,
    /// Date could not be parsed
    InvalidDate,
    /// Color was not #RRGGBB
    InvalidColor,
    /// No ordered statuses given
    NoTrackedStatuses,
    /// No JQL given
    MissingJql,

    // === Report Errors (exit code 5) ===
    /// Sprint analysis failed
    SprintError,
    /// Output would be overwritten
    OutputExists,

    // === Config Errors (exit code 7) ===
    /// Configuration error
    ConfigError,

    // === I/O Errors (exit code 8) ===
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,
    /// YAML parsing error
    YamlError,

    // === Internal Errors (exit code 1) ===
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HttpError => "HTTP_ERROR",
            Self::ApiError => "API_ERROR",
            Self::RateLimited => "RATE_LIMITED",
            Self::AuthFailed => "AUTH_FAILED",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::QueryNotFound => "QUERY_NOT_FOUND",
            Self::QueryExists => "QUERY_EXISTS",
            Self::ProfileNotFound => "PROFILE_NOT_FOUND",
            Self::TimelineConfigNotFound => "TIMELINE_CONFIG_NOT_FOUND",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::InvalidDate => "INVALID_DATE",
            Self::InvalidColor => "INVALID_COLOR",
            Self::NoTrackedStatuses => "NO_TRACKED_STATUSES",
            Self::MissingJql => "MISSING_JQL",
            Self::SprintError => "SPRINT_ERROR",
            Self::OutputExists => "OUTPUT_EXISTS",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether this error is potentially retryable.
    ///
    /// Retryable means the caller might succeed if it:
    /// - Waits and retries (e.g., network failure, rate limiting)
    /// - Fixes the input and retries (e.g., validation error)
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::HttpError
                | Self::RateLimited
                | Self::ValidationFailed
                | Self::InvalidDate
                | Self::InvalidColor
                | Self::MissingJql
        )
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 2: Jira errors
    /// - 3: Saved item errors
    /// - 4: Validation errors
    /// - 5: Report errors
    /// - 7: Config errors
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::HttpError
            | Self::ApiError
            | Self::RateLimited
            | Self::AuthFailed
            | Self::NotAuthenticated => 2,
            Self::QueryNotFound
            | Self::QueryExists
            | Self::ProfileNotFound
            | Self::TimelineConfigNotFound => 3,
            Self::ValidationFailed
            | Self::InvalidDate
            | Self::InvalidColor
            | Self::NoTrackedStatuses
            | Self::MissingJql => 4,
            Self::SprintError | Self::OutputExists => 5,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::YamlError => 8,
            Self::InternalError => 1,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `JiraMetricsError`.
    #[must_use]
    pub fn from_error(err: &JiraMetricsError) -> Self {
        if let JiraMetricsError::QueryNotFound { name, similar } = err {
            return Self::query_not_found(name, similar);
        }
        let (code, context) = Self::extract_code_and_context(err);
        let hint = Self::generate_hint(err, code);

        Self {
            code,
            message: err.to_string(),
            hint,
            retryable: code.is_retryable(),
            context,
        }
    }

    /// Structured error for a missing saved query, suggesting `similar` names.
    #[must_use]
    pub fn query_not_found(searched: &str, similar: &[String]) -> Self {
        let hint = if similar.is_empty() {
            Some("Run 'jm query list' to see saved queries.".to_string())
        } else if similar.len() == 1 {
            Some(format!("Did you mean '{}'?", similar[0]))
        } else {
            Some(format!("Did you mean one of: {}?", similar.join(", ")))
        };

        Self {
            code: ErrorCode::QueryNotFound,
            message: format!("Saved query not found: {searched}"),
            hint,
            retryable: false,
            context: Some(json!({
                "name": searched,
                "similar_names": similar,
            })),
        }
    }

    /// Serialize to JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &JiraMetricsError) -> (ErrorCode, Option<Value>) {
        match err {
            JiraMetricsError::Http(source) => (
                ErrorCode::HttpError,
                source.url().map(|url| json!({"url": url.as_str()})),
            ),
            JiraMetricsError::Api {
                status, url, message,
            } => {
                let code = if *status == 429 {
                    ErrorCode::RateLimited
                } else {
                    ErrorCode::ApiError
                };
                (
                    code,
                    Some(json!({"status": status, "url": url, "body": message})),
                )
            }
            JiraMetricsError::AuthFailed { base_url } => {
                (ErrorCode::AuthFailed, Some(json!({"base_url": base_url})))
            }
            JiraMetricsError::NotAuthenticated { missing } => {
                (ErrorCode::NotAuthenticated, Some(json!({"missing": missing})))
            }
            JiraMetricsError::Validation { field, reason } => (
                ErrorCode::ValidationFailed,
                Some(json!({"field": field, "reason": reason})),
            ),
            JiraMetricsError::InvalidDate { field, value } => (
                ErrorCode::InvalidDate,
                Some(json!({"field": field, "value": value})),
            ),
            JiraMetricsError::InvalidColor { status, color } => (
                ErrorCode::InvalidColor,
                Some(json!({"status": status, "color": color})),
            ),
            JiraMetricsError::NoTrackedStatuses => (ErrorCode::NoTrackedStatuses, None),
            JiraMetricsError::MissingJql => (ErrorCode::MissingJql, None),
            JiraMetricsError::QueryNotFound { name, similar } => (
                ErrorCode::QueryNotFound,
                Some(json!({"name": name, "similar_names": similar})),
            ),
            JiraMetricsError::QueryExists { name } => {
                (ErrorCode::QueryExists, Some(json!({"name": name})))
            }
            JiraMetricsError::ProfileNotFound { name } => {
                (ErrorCode::ProfileNotFound, Some(json!({"name": name})))
            }
            JiraMetricsError::TimelineConfigNotFound { name } => {
                (ErrorCode::TimelineConfigNotFound, Some(json!({"name": name})))
            }
            JiraMetricsError::Sprint { id, reason } => (
                ErrorCode::SprintError,
                Some(json!({"sprint_id": id, "reason": reason})),
            ),
            JiraMetricsError::OutputExists { path } => (
                ErrorCode::OutputExists,
                Some(json!({"path": path.display().to_string()})),
            ),
            JiraMetricsError::Config(_) => (ErrorCode::ConfigError, None),
            JiraMetricsError::Io(_) => (ErrorCode::IoError, None),
            JiraMetricsError::Json(_) => (ErrorCode::JsonError, None),
            JiraMetricsError::Yaml(_) => (ErrorCode::YamlError, None),
            JiraMetricsError::WithContext { context, source } => {
                let code = if source.is::<std::io::Error>() {
                    ErrorCode::IoError
                } else if source.is::<serde_json::Error>() {
                    ErrorCode::JsonError
                } else if source.is::<serde_yaml::Error>() {
                    ErrorCode::YamlError
                } else {
                    ErrorCode::InternalError
                };
                (code, Some(json!({"context": context})))
            }
            JiraMetricsError::Other(_) => (ErrorCode::InternalError, None),
        }
    }

    fn generate_hint(err: &JiraMetricsError, code: ErrorCode) -> Option<String> {
        if let Some(suggestion) = err.suggestion() {
            return Some(suggestion.to_string());
        }

        match (err, code) {
            (_, ErrorCode::RateLimited) => {
                Some("Jira is rate limiting requests; lower --workers and retry.".to_string())
            }
            (JiraMetricsError::Api { status: 401 | 403, .. }, _) => {
                Some("Check the API token permissions, then run: jm login".to_string())
            }
            (JiraMetricsError::Api { status: 400, .. }, _) => {
                Some("Check the JQL syntax with: jm search --jql \"...\"".to_string())
            }
            (JiraMetricsError::Http(_), _) => {
                Some("Check the Jira URL and network connectivity.".to_string())
            }
            _ => None,
        }
    }
}

/// Calculate the Levenshtein distance between two strings.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_len = a.chars().count();
    let b_len = b.chars().count();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut matrix = vec![vec![0; b_len + 1]; a_len + 1];

    for (i, row) in matrix.iter_mut().enumerate().take(a_len + 1) {
        row[0] = i;
    }
    for (j, item) in matrix[0].iter_mut().enumerate().take(b_len + 1) {
        *item = j;
    }

    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    for (i, a_char) in a_chars.iter().enumerate() {
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            matrix[i + 1][j + 1] = std::cmp::min(
                std::cmp::min(matrix[i][j + 1] + 1, matrix[i + 1][j] + 1),
                matrix[i][j] + cost,
            );
        }
    }

    matrix[a_len][b_len]
}

/// Find names similar to the searched name using Levenshtein distance.
///
/// Returns up to `max_suggestions` names with distance <= 3.
#[must_use]
pub fn find_similar_names(
    searched: &str,
    existing: &[String],
    max_suggestions: usize,
) -> Vec<String> {
    let mut candidates: Vec<(usize, &str)> = existing
        .iter()
        .map(|name| (levenshtein_distance(searched, name), name.as_str()))
        .filter(|(dist, _)| *dist <= 3)
        .collect();

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    candidates
        .into_iter()
        .take(max_suggestions)
        .map(|(_, name)| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::NotAuthenticated.as_str(), "NOT_AUTHENTICATED");
        assert_eq!(ErrorCode::InvalidColor.as_str(), "INVALID_COLOR");
    }

    #[test]
    fn test_error_code_exit_codes() {
        assert_eq!(ErrorCode::ApiError.exit_code(), 2);
        assert_eq!(ErrorCode::QueryNotFound.exit_code(), 3);
        assert_eq!(ErrorCode::InvalidDate.exit_code(), 4);
        assert_eq!(ErrorCode::ConfigError.exit_code(), 7);
        assert_eq!(ErrorCode::IoError.exit_code(), 8);
        assert_eq!(ErrorCode::InternalError.exit_code(), 1);
    }

    #[test]
    fn test_rate_limit_maps_to_own_code() {
        let err = JiraMetricsError::Api {
            status: 429,
            url: "https://x/rest/api/3/search".to_string(),
            message: String::new(),
        };
        let structured = StructuredError::from_error(&err);
        assert_eq!(structured.code, ErrorCode::RateLimited);
        assert!(structured.retryable);
        assert!(structured.hint.unwrap().contains("--workers"));
    }

    #[test]
    fn test_structured_error_to_json() {
        let err = JiraMetricsError::InvalidDate {
            field: "start".to_string(),
            value: "yesterday-ish".to_string(),
        };
        let json = StructuredError::from_error(&err).to_json();
        assert_eq!(json["error"]["code"], "INVALID_DATE");
        assert_eq!(json["error"]["context"]["value"], "yesterday-ish");
        assert_eq!(json["error"]["retryable"], true);
    }

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("same", "same"), 0);
    }

    #[test]
    fn test_query_not_found_suggests_close_names() {
        let existing = vec![
            "weekly".to_string(),
            "weekly-bugs".to_string(),
            "release".to_string(),
        ];
        let err = JiraMetricsError::QueryNotFound {
            name: "weekyl".to_string(),
            similar: find_similar_names("weekyl", &existing, 3),
        };
        let structured = StructuredError::from_error(&err);
        assert_eq!(structured.code, ErrorCode::QueryNotFound);
        assert_eq!(structured.hint.as_deref(), Some("Did you mean 'weekly'?"));
        assert_eq!(structured.context.unwrap()["similar_names"][0], "weekly");

        let none = JiraMetricsError::QueryNotFound {
            name: "zzz".to_string(),
            similar: find_similar_names("zzz", &existing, 3),
        };
        assert_eq!(
            StructuredError::from_error(&none).hint.as_deref(),
            Some("Run 'jm query list' to see saved queries.")
        );
    }

    #[test]
    fn test_to_human_output() {
        let err = JiraMetricsError::MissingJql;
        let human = StructuredError::from_error(&err).to_human(false);
        assert_eq!(
            human,
            "Error: No JQL query given\nHint: Pass --jql \"...\" or --query <NAME>"
        );
    }

    #[test]
    fn test_context_keeps_io_classification() {
        use crate::error::ResultExt;
        let err = std::fs::read_to_string("/definitely/missing/report.html")
            .context("Failed to read report")
            .unwrap_err();
        let structured = StructuredError::from_error(&err);
        assert_eq!(structured.code, ErrorCode::IoError);
        assert_eq!(structured.code.exit_code(), 8);
    }
}

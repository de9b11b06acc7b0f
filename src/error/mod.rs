//! Error types and handling for `jira_metrics`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Supports `anyhow` integration for ad-hoc context
//! - Provides recovery hints for user-facing errors
//! - Provides structured JSON output for scripted callers

mod context;
mod structured;

pub use context::ResultExt;
pub use structured::{ErrorCode, StructuredError, find_similar_names};

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `jira_metrics` operations.
#[derive(Error, Debug)]
pub enum JiraMetricsError {
    // === Jira API Errors ===
    /// Transport-level HTTP failure (DNS, TLS, timeout, decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Jira answered with a non-success status.
    #[error("Jira API returned {status} for {url}: {message}")]
    Api {
        status: u16,
        url: String,
        message: String,
    },

    /// Jira rejected the credentials.
    #[error("Authentication failed for {base_url}")]
    AuthFailed { base_url: String },

    /// No Jira URL/email/token could be resolved.
    #[error("Not logged in: missing {missing}")]
    NotAuthenticated { missing: String },

    // === Input Errors ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// A date or timestamp could not be parsed.
    #[error("Invalid date for {field}: '{value}'")]
    InvalidDate { field: String, value: String },

    /// A colour was not `#RRGGBB`.
    #[error("Invalid color for '{status}': '{color}'")]
    InvalidColor { status: String, color: String },

    /// Timeline generation needs at least one ordered status.
    #[error("No tracked statuses configured")]
    NoTrackedStatuses,

    /// No JQL string (or saved query) was given.
    #[error("No JQL query given")]
    MissingJql,

    // === Saved Item Errors ===
    /// Saved JQL query not found. `similar` holds close saved names.
    #[error("Saved query not found: {name}")]
    QueryNotFound { name: String, similar: Vec<String> },

    /// Saved JQL query name already taken.
    #[error("Saved query already exists: {name}")]
    QueryExists { name: String },

    /// Export profile not found.
    #[error("Export profile not found: {name}")]
    ProfileNotFound { name: String },

    /// Saved timeline configuration not found.
    #[error("Timeline config not found: {name}")]
    TimelineConfigNotFound { name: String },

    // === Sprint Errors ===
    /// Sprint could not be analysed.
    #[error("Sprint {id}: {reason}")]
    Sprint { id: u64, reason: String },

    // === Configuration Errors ===
    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Output file or directory already exists and overwriting was not requested.
    #[error("Refusing to overwrite '{path}'")]
    OutputExists { path: PathBuf },

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Wrapped errors ===
    /// Error with additional context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl JiraMetricsError {
    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::NotAuthenticated { .. } => {
                Some("Run: jm login --url <URL> --email <EMAIL> --token <TOKEN>")
            }
            Self::AuthFailed { .. } => Some("Check the email and API token, then run: jm login"),
            Self::InvalidDate { .. } => Some("Use YYYY-MM-DD, YYYY-MM-DD HH:MM or RFC 3339"),
            Self::InvalidColor { .. } => Some("Colors must look like #RRGGBB"),
            Self::NoTrackedStatuses => Some("Pass at least one --status \"NAME=ORDER\""),
            Self::MissingJql => Some("Pass --jql \"...\" or --query <NAME>"),
            Self::QueryExists { .. } => Some("Use: jm query update"),
            Self::ProfileNotFound { .. } => Some("Run: jm profile list"),
            Self::TimelineConfigNotFound { .. } => Some("Run: jm timeline-config list"),
            Self::OutputExists { .. } => Some("Use --force to overwrite"),
            _ => None,
        }
    }

    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid-date error.
    #[must_use]
    pub fn invalid_date(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidDate {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Result type using `JiraMetricsError`.
pub type Result<T> = std::result::Result<T, JiraMetricsError>;

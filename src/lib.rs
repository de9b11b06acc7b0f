//! `jira_metrics` - Jira issue export, timeline and sprint analysis.
//!
//! The crate talks to the Jira Cloud REST API and turns issue data into:
//! - CSV exports with time-in-status, transition and comment metrics
//! - Per-issue JSON and Markdown dumps
//! - Static HTML timeline reports of status intervals
//! - Sprint transition reports
//!
//! The `jm` binary in `main.rs` is a thin clap front end over these modules.

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod output;
pub mod recolor;
pub mod sprint;
pub mod timeline;
pub mod util;

pub use error::{ErrorCode, JiraMetricsError, Result, StructuredError};

//! Shared utilities for `jira_metrics`.
//!
//! Common functionality used across modules:
//! - Stable hashing (SHA256) for generated class names
//! - Time parsing and formatting
//! - Progress indicators (for long-running operations)
//! - The bounded worker pool used for per-issue downloads
//! - Atomic file writes

mod hash;
pub mod pool;
pub mod progress;
pub mod time;

pub use hash::{sha256_hex, status_css_class};
pub use pool::{DEFAULT_WORKERS, fetch_all};
pub use progress::{NoProgress, ProgressSink, StageProgress};

use crate::error::{JiraMetricsError, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Write `contents` to `path` through a sibling temp file and a rename.
///
/// Parent directories are created. Readers never observe a partial file.
///
/// # Errors
///
/// Returns an error if the directory, temp file or rename fails.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    write_via_temp(path, contents, false)
}

/// Like [`atomic_write`], but the result is readable only by the owner (0600).
///
/// # Errors
///
/// Returns an error if the directory, temp file or rename fails.
pub fn atomic_write_private(path: &Path, contents: &[u8]) -> Result<()> {
    write_via_temp(path, contents, true)
}

fn write_via_temp(path: &Path, contents: &[u8], private: bool) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        Some(_) => Path::new("."),
        None => {
            return Err(JiraMetricsError::Config(format!(
                "Invalid output path: {}",
                path.display()
            )));
        }
    };
    fs::create_dir_all(parent)?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let temp_path = parent.join(format!(".{file_name}.tmp"));

    let temp_file = File::create(&temp_path)?;
    let mut writer = BufWriter::new(temp_file);
    writer.write_all(contents)?;
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| JiraMetricsError::Io(e.into_error()))?
        .sync_all()?;

    #[cfg(unix)]
    if private {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))?;
    }
    #[cfg(not(unix))]
    let _ = private;

    fs::rename(&temp_path, path)?;
    debug!(path = %path.display(), bytes = contents.len(), "Wrote file");
    Ok(())
}

/// Split a `NAME=VALUE` argument on its last `=`.
///
/// # Errors
///
/// Returns a validation error when the `=` is missing or the name is empty.
pub fn split_name_value<'a>(raw: &'a str, field: &str) -> Result<(&'a str, &'a str)> {
    let (name, value) = raw
        .rsplit_once('=')
        .ok_or_else(|| JiraMetricsError::validation(field, format!("expected NAME=VALUE, got '{raw}'")))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(JiraMetricsError::validation(
            field,
            format!("empty name in '{raw}'"),
        ));
    }
    Ok((name, value.trim()))
}

//! Command implementations. Each module exposes an `execute` entry point.

pub mod completions;
pub mod config;
pub mod export;
pub mod fields;
pub mod login;
pub mod profile;
pub mod projects;
pub mod query;
pub mod recolor;
pub mod search;
pub mod sprint;
pub mod statuses;
pub mod timeline;
pub mod timeline_config;
pub mod version;
pub mod whoami;

use crate::cli::{Cli, JqlArgs};
use crate::client::JiraClient;
use crate::config::{AppPaths, CliOverrides, ConfigLayer, Settings};
use crate::error::{JiraMetricsError, Result};
use crate::model::FieldCatalog;
use crate::output::OutputContext;
use crate::util::StageProgress;
use std::path::Path;
use tracing::debug;

/// Everything a command needs: paths, merged settings and the output sink.
pub struct Session {
    pub paths: AppPaths,
    pub layer: ConfigLayer,
    pub settings: Settings,
    pub out: OutputContext,
}

impl Session {
    /// Resolve the app directory and merge every configuration layer.
    ///
    /// # Errors
    ///
    /// Returns an error if a config source cannot be read or holds invalid values.
    pub fn load(cli: &Cli) -> Result<Self> {
        let paths = AppPaths::discover()?;
        let layer = crate::config::load_config(&paths, &overrides(cli))?;
        let settings = Settings::from_layer(&layer)?;
        debug!(root = %paths.root.display(), workers = settings.workers, "Session ready");
        Ok(Self {
            paths,
            layer,
            settings,
            out: OutputContext::from_args(cli),
        })
    }

    /// # Errors
    ///
    /// Returns `NotAuthenticated` when the connection settings are incomplete.
    pub fn client(&self) -> Result<JiraClient> {
        self.settings.client()
    }

    /// Progress bar for long operations; hidden for JSON and quiet output.
    #[must_use]
    pub fn progress(&self) -> StageProgress {
        if self.out.is_json() || self.out.is_quiet() {
            StageProgress::with_visibility(false)
        } else {
            StageProgress::new()
        }
    }

    /// JQL from `--jql` or a saved `--query`.
    ///
    /// # Errors
    ///
    /// Returns `MissingJql` when neither is given, or `QueryNotFound`.
    pub fn resolve_jql(&self, source: &JqlArgs) -> Result<String> {
        self.optional_jql(source)?
            .ok_or(JiraMetricsError::MissingJql)
    }

    /// Like [`Session::resolve_jql`] but absence is not an error.
    ///
    /// # Errors
    ///
    /// Returns `QueryNotFound` for an unknown saved query.
    pub fn optional_jql(&self, source: &JqlArgs) -> Result<Option<String>> {
        if let Some(jql) = source.jql.as_deref().map(str::trim).filter(|j| !j.is_empty()) {
            return Ok(Some(jql.to_string()));
        }
        match source.query.as_deref() {
            Some(name) => Ok(Some(self.paths.queries().get(name)?.jql)),
            None => Ok(None),
        }
    }
}

/// Map global flags onto the highest-precedence config layer.
#[must_use]
pub fn overrides(cli: &Cli) -> CliOverrides {
    CliOverrides {
        url: cli.url.clone(),
        email: cli.email.clone(),
        token: cli.token.clone(),
        workers: cli.workers,
        timeout: cli.timeout,
    }
}

/// Download the field catalog used to translate ids and names.
///
/// # Errors
///
/// Returns an error if the request fails.
pub fn field_catalog(client: &JiraClient) -> Result<FieldCatalog> {
    let defs = client.get_fields()?;
    Ok(FieldCatalog::from_defs(&defs))
}

/// Refuse to overwrite `path` unless `force` is set.
///
/// # Errors
///
/// Returns `OutputExists` when the file is present.
pub fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    if !force && path.exists() {
        return Err(JiraMetricsError::OutputExists {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_writable() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.csv");
        assert!(ensure_writable(&path, false).is_ok());
        std::fs::write(&path, "x").unwrap();
        assert!(matches!(
            ensure_writable(&path, false),
            Err(JiraMetricsError::OutputExists { .. })
        ));
        assert!(ensure_writable(&path, true).is_ok());
    }
}

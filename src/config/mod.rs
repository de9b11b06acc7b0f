//! Configuration management for `jira_metrics`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides (`--url`, `--email`, `--token`, `--workers`)
//! 2. Environment variables (`JM_*`, plus `JIRA_URL`, `JIRA_EMAIL`, `JIRA_API_TOKEN`)
//! 3. App config (`<app dir>/config.yaml`)
//! 4. Saved credentials (`<app dir>/credentials.json`, written by `jm login`)
//! 5. Defaults
//!
//! The app directory is `$JM_HOME`, else `~/.jira_metrics`. Saved queries,
//! export profiles and timeline configurations live under it as well.

mod profiles;
mod queries;
mod timeline;

pub use profiles::{ExportProfile, MetricFlags, ProfileStore, TransitionRule};
pub use queries::{QueryStore, SavedQuery};
pub use timeline::{SavedStatus, TimelineConfig, TimelineConfigStore};

use crate::client::JiraClient;
use crate::error::{JiraMetricsError, Result};
use crate::util::{DEFAULT_WORKERS, atomic_write_private};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Directory name under `$HOME` when `JM_HOME` is not set.
pub const APP_DIR_NAME: &str = ".jira_metrics";
/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const CONFIG_FILE: &str = "config.yaml";
const CREDENTIALS_FILE: &str = "credentials.json";
const PROFILES_DIR: &str = "configs";
const QUERIES_FILE: &str = "saved_jql_queries.json";
const TIMELINE_DIR: &str = "saved_timeline_configs";
const TIMELINE_LAST_FILE: &str = "timeline_last_config.json";

pub const KEY_URL: &str = "jira.url";
pub const KEY_EMAIL: &str = "jira.email";
pub const KEY_TOKEN: &str = "jira.token";
pub const KEY_WORKERS: &str = "workers";
pub const KEY_TIMEOUT: &str = "timeout";

/// Locations of every file the CLI reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub root: PathBuf,
}

impl AppPaths {
    /// Resolve the app directory from `JM_HOME` or `HOME`.
    ///
    /// # Errors
    ///
    /// Returns a config error when neither variable is set.
    pub fn discover() -> Result<Self> {
        discover_with_env(env::var("JM_HOME").ok(), env::var("HOME").ok())
    }

    #[must_use]
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    #[must_use]
    pub fn credentials_file(&self) -> PathBuf {
        self.root.join(CREDENTIALS_FILE)
    }

    #[must_use]
    pub fn profiles_dir(&self) -> PathBuf {
        self.root.join(PROFILES_DIR)
    }

    #[must_use]
    pub fn queries_file(&self) -> PathBuf {
        self.root.join(QUERIES_FILE)
    }

    #[must_use]
    pub fn timeline_dir(&self) -> PathBuf {
        self.root.join(TIMELINE_DIR)
    }

    #[must_use]
    pub fn last_timeline_file(&self) -> PathBuf {
        self.root.join(TIMELINE_LAST_FILE)
    }

    #[must_use]
    pub fn queries(&self) -> QueryStore {
        QueryStore::new(self.queries_file())
    }

    #[must_use]
    pub fn profiles(&self) -> ProfileStore {
        ProfileStore::new(self.profiles_dir())
    }

    #[must_use]
    pub fn timeline_configs(&self) -> TimelineConfigStore {
        TimelineConfigStore::new(self.timeline_dir(), self.last_timeline_file())
    }
}

fn discover_with_env(jm_home: Option<String>, home: Option<String>) -> Result<AppPaths> {
    if let Some(root) = jm_home.filter(|value| !value.trim().is_empty()) {
        return Ok(AppPaths::at(root));
    }
    match home.filter(|value| !value.trim().is_empty()) {
        Some(home) => Ok(AppPaths::at(Path::new(&home).join(APP_DIR_NAME))),
        None => Err(JiraMetricsError::Config(
            "Cannot locate the app directory: set JM_HOME or HOME".to_string(),
        )),
    }
}

/// Credentials saved by `jm login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
}

impl Credentials {
    /// Load saved credentials. A missing file yields `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Save credentials readable only by the owner.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        atomic_write_private(path, json.as_bytes())?;
        debug!(path = %path.display(), "Saved credentials");
        Ok(())
    }

    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();
        for (key, value) in [
            (KEY_URL, &self.base_url),
            (KEY_EMAIL, &self.email),
            (KEY_TOKEN, &self.api_token),
        ] {
            if !value.trim().is_empty() {
                layer.insert(key, value.clone());
            }
        }
        layer
    }
}

/// One configuration source, flattened to dotted keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Insert a value under its normalized key.
    pub fn insert(&mut self, key: &str, value: String) {
        self.values.insert(normalize_key(key), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&normalize_key(key))
            .map(String::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        Ok(layer_from_yaml_value(&value))
    }

    /// Build a layer from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_vars(env::vars())
    }

    /// Build a layer from `(name, value)` pairs shaped like environment variables.
    #[must_use]
    pub fn from_env_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();
        let mut prefixed = Vec::new();

        for (key, value) in vars {
            match key.as_str() {
                "JIRA_URL" => layer.insert(KEY_URL, value),
                "JIRA_EMAIL" => layer.insert(KEY_EMAIL, value),
                "JIRA_API_TOKEN" => layer.insert(KEY_TOKEN, value),
                _ => {
                    if let Some(stripped) = key.strip_prefix("JM_") {
                        if !matches!(stripped, "HOME" | "LOG") {
                            prefixed.push((stripped.to_string(), value));
                        }
                    }
                }
            }
        }

        // JM_* wins over the bare JIRA_* names.
        for (key, value) in prefixed {
            layer.insert(&key, value);
        }

        layer
    }

    /// Sorted `(key, value)` pairs with the API token masked.
    #[must_use]
    pub fn redacted_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .values
            .iter()
            .map(|(key, value)| {
                let shown = if key == KEY_TOKEN {
                    mask_secret(value)
                } else {
                    value.clone()
                };
                (key.clone(), shown)
            })
            .collect();
        pairs.sort();
        pairs
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub url: Option<String>,
    pub email: Option<String>,
    pub token: Option<String>,
    pub workers: Option<usize>,
    pub timeout: Option<u64>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(url) = &self.url {
            layer.insert(KEY_URL, url.clone());
        }
        if let Some(email) = &self.email {
            layer.insert(KEY_EMAIL, email.clone());
        }
        if let Some(token) = &self.token {
            layer.insert(KEY_TOKEN, token.clone());
        }
        if let Some(workers) = self.workers {
            layer.insert(KEY_WORKERS, workers.to_string());
        }
        if let Some(timeout) = self.timeout {
            layer.insert(KEY_TIMEOUT, timeout.to_string());
        }

        layer
    }
}

/// Default config layer (lowest precedence).
#[must_use]
pub fn default_config_layer() -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    layer.insert(KEY_WORKERS, DEFAULT_WORKERS.to_string());
    layer.insert(KEY_TIMEOUT, DEFAULT_TIMEOUT_SECS.to_string());
    layer
}

/// Load configuration with the documented precedence order.
///
/// # Errors
///
/// Returns an error if the YAML config or saved credentials cannot be read or parsed.
pub fn load_config(paths: &AppPaths, cli: &CliOverrides) -> Result<ConfigLayer> {
    let defaults = default_config_layer();
    let credentials = Credentials::load(&paths.credentials_file())?
        .map(|creds| creds.as_layer())
        .unwrap_or_default();
    let yaml = ConfigLayer::from_yaml(&paths.config_file())?;
    let env_layer = ConfigLayer::from_env();
    let cli_layer = cli.as_layer();

    Ok(ConfigLayer::merge_layers(&[
        defaults,
        credentials,
        yaml,
        env_layer,
        cli_layer,
    ]))
}

/// Typed view of a merged [`ConfigLayer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub url: Option<String>,
    pub email: Option<String>,
    pub token: Option<String>,
    pub workers: usize,
    pub timeout_secs: u64,
}

impl Settings {
    /// # Errors
    ///
    /// Returns a config error when `workers` or `timeout` is not a positive integer.
    pub fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let workers = parse_positive(layer, KEY_WORKERS)?.unwrap_or(DEFAULT_WORKERS as u64);
        let timeout_secs = parse_positive(layer, KEY_TIMEOUT)?.unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            url: layer.get(KEY_URL).map(|url| url.trim_end_matches('/').to_string()),
            email: layer.get(KEY_EMAIL).map(str::to_string),
            token: layer.get(KEY_TOKEN).map(str::to_string),
            workers: usize::try_from(workers).unwrap_or(DEFAULT_WORKERS),
            timeout_secs,
        })
    }

    /// Names of the connection settings that are still unset.
    #[must_use]
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.url.is_none() {
            missing.push(KEY_URL);
        }
        if self.email.is_none() {
            missing.push(KEY_EMAIL);
        }
        if self.token.is_none() {
            missing.push(KEY_TOKEN);
        }
        missing
    }

    /// Build an HTTP client from the resolved connection settings.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when a connection setting is missing, or an
    /// HTTP error if the client cannot be constructed.
    pub fn client(&self) -> Result<JiraClient> {
        let (Some(url), Some(email), Some(token)) = (&self.url, &self.email, &self.token) else {
            return Err(JiraMetricsError::NotAuthenticated {
                missing: self.missing_credentials().join(", "),
            });
        };
        JiraClient::new(url, email, token, Duration::from_secs(self.timeout_secs))
    }
}

fn parse_positive(layer: &ConfigLayer, key: &str) -> Result<Option<u64>> {
    let Some(raw) = layer.get(key) else {
        return Ok(None);
    };
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(Some(value)),
        _ => Err(JiraMetricsError::Config(format!(
            "{key} must be a positive integer, got '{raw}'"
        ))),
    }
}

fn mask_secret(value: &str) -> String {
    let visible: String = value.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    if value.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("****{visible}")
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace(['_', '-'], ".")
}

fn layer_from_yaml_value(value: &serde_yaml::Value) -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    let mut flat = HashMap::new();
    flatten_yaml(value, "", &mut flat);

    for (key, value) in flat {
        layer.insert(&key, value);
    }

    layer
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut HashMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(values) => {
            let joined = values
                .iter()
                .filter_map(yaml_scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}

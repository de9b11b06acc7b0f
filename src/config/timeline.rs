//! Saved timeline report configurations plus the auto-saved last-used one.

use super::profiles::validate_name;
use crate::error::{JiraMetricsError, Result, ResultExt};
use crate::util::atomic_write;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedStatus {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_order")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelineConfig {
    #[serde(rename = "_config_name", default, skip_serializing_if = "String::is_empty")]
    pub config_name: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub jql: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default, deserialize_with = "lenient_order_map")]
    pub status_order: BTreeMap<String, i64>,
    #[serde(default)]
    pub status_colors: BTreeMap<String, String>,
    #[serde(default)]
    pub saved_statuses: Vec<SavedStatus>,
}

impl TimelineConfig {
    /// Rebuild `saved_statuses` from the order and color maps.
    #[must_use]
    pub fn with_saved_statuses(mut self) -> Self {
        let names: BTreeSet<&String> = self
            .status_order
            .keys()
            .chain(self.status_colors.keys())
            .collect();
        self.saved_statuses = names
            .into_iter()
            .map(|name| SavedStatus {
                name: name.clone(),
                order: self.status_order.get(name).copied(),
                color: self.status_colors.get(name).cloned(),
            })
            .collect();
        self
    }
}

fn lenient_order<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(order_from_value))
}

fn lenient_order_map<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(name, value)| order_from_value(&value).map(|order| (name, order)))
        .collect())
}

/// Orders were historically saved as strings.
fn order_from_value(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Directory of named configs plus a single last-used file.
#[derive(Debug, Clone)]
pub struct TimelineConfigStore {
    dir: PathBuf,
    last_file: PathBuf,
}

impl TimelineConfigStore {
    #[must_use]
    pub fn new(dir: PathBuf, last_file: PathBuf) -> Self {
        Self { dir, last_file }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.json")))
    }

    /// Sorted config names.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be listed.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string_lossy().to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// # Errors
    ///
    /// Returns `TimelineConfigNotFound` for an unknown name, or a parse error.
    pub fn load(&self, name: &str) -> Result<TimelineConfig> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Err(JiraMetricsError::TimelineConfigNotFound {
                name: name.to_string(),
            });
        }
        read_config(&path)
    }

    /// The last configuration a report was generated with, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_last(&self) -> Result<Option<TimelineConfig>> {
        if !self.last_file.exists() {
            return Ok(None);
        }
        read_config(&self.last_file).map(Some)
    }

    /// Save under `name` and record it as the last used configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid name or a failed write.
    pub fn save(&self, name: &str, config: &TimelineConfig) -> Result<PathBuf> {
        let path = self.path_for(name)?;
        let mut config = config.clone().with_saved_statuses();
        config.config_name = name.trim().to_string();
        write_config(&path, &config)?;
        write_config(&self.last_file, &config)?;
        debug!(name, path = %path.display(), "Saved timeline config");
        Ok(path)
    }

    /// Overwrite the last-used configuration only.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_last(&self, config: &TimelineConfig) -> Result<()> {
        let config = config.clone().with_saved_statuses();
        write_config(&self.last_file, &config)?;
        debug!(path = %self.last_file.display(), "Auto-saved last timeline config");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `TimelineConfigNotFound` for an unknown name.
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Err(JiraMetricsError::TimelineConfigNotFound {
                name: name.to_string(),
            });
        }
        fs::remove_file(&path)?;
        debug!(name, "Deleted timeline config");
        Ok(())
    }
}

fn read_config(path: &Path) -> Result<TimelineConfig> {
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn write_config(path: &Path, config: &TimelineConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    atomic_write(path, json.as_bytes())
}

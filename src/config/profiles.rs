//! Named CSV export profiles, one JSON file each under `configs/`.

use crate::error::{JiraMetricsError, Result, ResultExt};
use crate::metrics::BusinessHours;
use crate::util::{atomic_write, split_name_value};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// A named status sequence counted in each issue's changelog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransitionRule {
    pub name: String,
    pub sequence: Vec<String>,
}

impl TransitionRule {
    /// Parse `NAME=Status A>Status B>...`.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the name is empty or fewer than two
    /// statuses are given.
    pub fn parse(raw: &str) -> Result<Self> {
        let (name, steps) = split_name_value(raw, "rule")?;
        let rule = Self {
            name: name.to_string(),
            sequence: steps.split('>').map(str::to_string).collect(),
        }
        .cleaned()
        .ok_or_else(|| {
            JiraMetricsError::validation("rule", format!("'{raw}' needs at least two statuses"))
        })?;
        Ok(rule)
    }

    /// Trimmed copy, or `None` when the rule is unusable.
    fn cleaned(&self) -> Option<Self> {
        let name = self.name.trim();
        let sequence: Vec<String> = self
            .sequence
            .iter()
            .map(|step| step.trim())
            .filter(|step| !step.is_empty())
            .map(str::to_string)
            .collect();
        (!name.is_empty() && sequence.len() >= 2).then(|| Self {
            name: name.to_string(),
            sequence,
        })
    }
}

/// Which derived metric columns an export includes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricFlags {
    #[serde(default)]
    pub time_in_status: bool,
    #[serde(default)]
    pub comment_count: bool,
    #[serde(default)]
    pub comment_length: bool,
    #[serde(default)]
    pub commenter_count: bool,
}

impl MetricFlags {
    #[must_use]
    pub const fn any_comment_metric(&self) -> bool {
        self.comment_count || self.comment_length || self.commenter_count
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportProfile {
    pub name: String,
    #[serde(default)]
    pub selected_field_ids: Vec<String>,
    #[serde(default)]
    pub selected_field_names: Vec<String>,
    /// Older profiles stored ids here.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_fields: Vec<String>,
    #[serde(default)]
    pub transition_rules: Vec<TransitionRule>,
    #[serde(default)]
    pub metrics: MetricFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_hours: Option<BusinessHours>,
}

impl ExportProfile {
    /// Apply the legacy field fallback and drop unusable rules.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.selected_field_ids.is_empty() {
            self.selected_field_ids = std::mem::take(&mut self.selected_fields);
        } else {
            self.selected_fields.clear();
        }

        let before = self.transition_rules.len();
        self.transition_rules = self
            .transition_rules
            .iter()
            .filter_map(TransitionRule::cleaned)
            .collect();
        let dropped = before - self.transition_rules.len();
        if dropped > 0 {
            warn!(profile = %self.name, dropped, "Dropped transition rules without a name or two statuses");
        }
        self
    }
}

/// Directory of `<name>.json` profile files.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.json")))
    }

    /// Sorted profile names.
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
    /// Returns `ProfileNotFound` for an unknown name, or a parse error.
    pub fn load(&self, name: &str) -> Result<ExportProfile> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Err(JiraMetricsError::ProfileNotFound {
                name: name.to_string(),
            });
        }
        let contents = fs::read_to_string(&path)?;
        let mut profile: ExportProfile = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        if profile.name.trim().is_empty() {
            profile.name = name.to_string();
        }
        Ok(profile.normalized())
    }

    /// Write the profile under its own name, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid name or a failed write.
    pub fn save(&self, profile: &ExportProfile) -> Result<PathBuf> {
        let path = self.path_for(&profile.name)?;
        let profile = profile.clone().normalized();
        let json = serde_json::to_string_pretty(&profile)?;
        atomic_write(&path, json.as_bytes())?;
        debug!(name = %profile.name, path = %path.display(), "Saved export profile");
        Ok(path)
    }

    /// # Errors
    ///
    /// Returns `ProfileNotFound` for an unknown name.
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Err(JiraMetricsError::ProfileNotFound {
                name: name.to_string(),
            });
        }
        fs::remove_file(&path)?;
        debug!(name, "Deleted export profile");
        Ok(())
    }
}

/// Reject names that would escape the store directory.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(JiraMetricsError::validation("name", "cannot be empty"));
    }
    if trimmed.starts_with('.') || trimmed.contains(['/', '\\']) {
        return Err(JiraMetricsError::validation(
            "name",
            format!("'{name}' must not start with '.' or contain path separators"),
        ));
    }
    Ok(())
}

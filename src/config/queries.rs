//! Saved JQL queries, stored as one JSON list.

use crate::error::{JiraMetricsError, Result, ResultExt, find_similar_names};
use crate::util::atomic_write;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const MAX_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavedQuery {
    pub name: String,
    pub jql: String,
    #[serde(default)]
    pub description: String,
}

/// File-backed list of [`SavedQuery`] entries.
#[derive(Debug, Clone)]
pub struct QueryStore {
    path: PathBuf,
}

impl QueryStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All saved queries in file order. A missing file is an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is unreadable or corrupt.
    pub fn list(&self) -> Result<Vec<SavedQuery>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn names(&self) -> Result<Vec<String>> {
        Ok(self.list()?.into_iter().map(|query| query.name).collect())
    }

    /// # Errors
    ///
    /// Returns `QueryNotFound` for an unknown name.
    pub fn get(&self, name: &str) -> Result<SavedQuery> {
        let queries = self.list()?;
        queries
            .iter()
            .find(|query| query.name == name)
            .cloned()
            .ok_or_else(|| not_found(name, &queries))
    }

    /// Append a new query.
    ///
    /// # Errors
    ///
    /// Returns `QueryExists` when the name is taken, or a validation error for
    /// an empty name or JQL.
    pub fn add(&self, name: &str, jql: &str, description: &str) -> Result<SavedQuery> {
        let query = validated(name, jql, description)?;
        let mut queries = self.list()?;
        if queries.iter().any(|existing| existing.name == query.name) {
            return Err(JiraMetricsError::QueryExists { name: query.name });
        }
        queries.push(query.clone());
        self.write(&queries)?;
        debug!(name = %query.name, "Added saved query");
        Ok(query)
    }

    /// Replace the JQL and description of an existing query.
    ///
    /// # Errors
    ///
    /// Returns `QueryNotFound` for an unknown name.
    pub fn update(&self, name: &str, jql: &str, description: &str) -> Result<SavedQuery> {
        let updated = validated(name, jql, description)?;
        let mut queries = self.list()?;
        let Some(idx) = queries
            .iter()
            .position(|existing| existing.name == updated.name)
        else {
            return Err(not_found(&updated.name, &queries));
        };
        queries[idx] = updated.clone();
        self.write(&queries)?;
        debug!(name = %updated.name, "Updated saved query");
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns `QueryNotFound` for an unknown name.
    pub fn delete(&self, name: &str) -> Result<()> {
        let mut queries = self.list()?;
        let before = queries.len();
        queries.retain(|query| query.name != name);
        if queries.len() == before {
            return Err(not_found(name, &queries));
        }
        self.write(&queries)?;
        debug!(name, "Deleted saved query");
        Ok(())
    }

    fn write(&self, queries: &[SavedQuery]) -> Result<()> {
        let json = serde_json::to_string_pretty(queries)?;
        atomic_write(&self.path, json.as_bytes())
    }
}

fn not_found(name: &str, queries: &[SavedQuery]) -> JiraMetricsError {
    let names: Vec<String> = queries.iter().map(|query| query.name.clone()).collect();
    JiraMetricsError::QueryNotFound {
        name: name.to_string(),
        similar: find_similar_names(name, &names, MAX_SUGGESTIONS),
    }
}

fn validated(name: &str, jql: &str, description: &str) -> Result<SavedQuery> {
    let name = name.trim();
    let jql = jql.trim();
    if name.is_empty() {
        return Err(JiraMetricsError::validation("name", "cannot be empty"));
    }
    if jql.is_empty() {
        return Err(JiraMetricsError::validation("jql", "cannot be empty"));
    }
    Ok(SavedQuery {
        name: name.to_string(),
        jql: jql.to_string(),
        description: description.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(temp: &TempDir) -> QueryStore {
        QueryStore::new(temp.path().join("saved_jql_queries.json"))
    }

    #[test]
    fn missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(store(&temp).list().unwrap().is_empty());
    }

    #[test]
    fn add_get_and_names() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.add("open", "status = Open", "Open work").unwrap();
        store.add("mine", "assignee = currentUser()", "").unwrap();

        assert_eq!(store.names().unwrap(), vec!["open", "mine"]);
        assert_eq!(store.get("open").unwrap().description, "Open work");
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.add("open", "status = Open", "").unwrap();
        let err = store.add("open", "status = Done", "").unwrap_err();
        assert!(matches!(err, JiraMetricsError::QueryExists { .. }));
    }

    #[test]
    fn update_and_delete_unknown_fail() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        assert!(matches!(
            store.update("ghost", "x = 1", "").unwrap_err(),
            JiraMetricsError::QueryNotFound { .. }
        ));
        assert!(matches!(
            store.delete("ghost").unwrap_err(),
            JiraMetricsError::QueryNotFound { .. }
        ));
    }

    #[test]
    fn unknown_name_carries_close_matches() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.add("weekly", "project = A", "").unwrap();
        store.add("release", "fixVersion = 2", "").unwrap();

        match store.get("weekyl").unwrap_err() {
            JiraMetricsError::QueryNotFound { name, similar } => {
                assert_eq!(name, "weekyl");
                assert_eq!(similar, vec!["weekly"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn update_then_delete() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.add("open", "status = Open", "").unwrap();
        store.update("open", "status = Reopened", "changed").unwrap();
        assert_eq!(store.get("open").unwrap().jql, "status = Reopened");

        store.delete("open").unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        fs::write(store.path(), "{not json").unwrap();
        assert!(store.list().is_err());
    }

    #[test]
    fn legacy_file_without_description_loads() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        fs::write(store.path(), r#"[{"name": "a", "jql": "project = A"}]"#).unwrap();
        assert_eq!(store.get("a").unwrap().description, "");
    }
}

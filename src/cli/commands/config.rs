//! `jm config`: where files live and what the merged settings are.

use super::Session;
use crate::cli::ConfigCommands;
use crate::error::Result;
use crate::output::DetailPanel;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Serialize)]
struct PathsOutput {
    root: String,
    config_file: String,
    credentials_file: String,
    queries_file: String,
    profiles_dir: String,
    timeline_dir: String,
}

/// # Errors
///
/// Never fails once the session is loaded.
pub fn execute(command: &ConfigCommands, session: &Session) -> Result<()> {
    let out = &session.out;
    match command {
        ConfigCommands::Path => {
            let paths = &session.paths;
            let shown = PathsOutput {
                root: display(&paths.root),
                config_file: display(&paths.config_file()),
                credentials_file: display(&paths.credentials_file()),
                queries_file: display(&paths.queries_file()),
                profiles_dir: display(&paths.profiles_dir()),
                timeline_dir: display(&paths.timeline_dir()),
            };
            if out.is_json() {
                out.json(&shown);
                return Ok(());
            }
            let mut panel = DetailPanel::new("Application files", out.theme());
            panel
                .add("Root", shown.root)
                .add("Config", shown.config_file)
                .add("Credentials", shown.credentials_file)
                .add("Queries", shown.queries_file)
                .add("Profiles", shown.profiles_dir)
                .add("Timelines", shown.timeline_dir);
            out.details(&panel);
        }
        ConfigCommands::Show => {
            let pairs = session.layer.redacted_pairs();
            if out.is_json() {
                let map: BTreeMap<String, String> = pairs.into_iter().collect();
                out.json(&map);
                return Ok(());
            }
            let mut panel = DetailPanel::new("Configuration", out.theme());
            for (key, value) in pairs {
                panel.add(key, value);
            }
            out.details(&panel);
        }
    }
    Ok(())
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

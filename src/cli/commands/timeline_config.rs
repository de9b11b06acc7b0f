use super::Session;
use crate::cli::TimelineConfigCommands;
use crate::config::TimelineConfig;
use crate::error::{JiraMetricsError, Result};
use crate::output::{DataTable, DetailPanel, OutputContext};
use serde::Serialize;

const LAST: &str = "last";

#[derive(Serialize)]
struct ConfigList<'a> {
    configs: &'a [String],
    has_last: bool,
}

/// # Errors
///
/// Returns `TimelineConfigNotFound` for an unknown name, or an I/O error.
pub fn execute(command: &TimelineConfigCommands, session: &Session) -> Result<()> {
    let store = session.paths.timeline_configs();
    let out = &session.out;
    match command {
        TimelineConfigCommands::List => {
            let names = store.list()?;
            let has_last = store.load_last()?.is_some();
            if out.is_json() {
                out.json(&ConfigList {
                    configs: &names,
                    has_last,
                });
            } else if names.is_empty() {
                out.info("No saved timeline configurations");
            } else {
                let mut table = DataTable::new(["Configuration"], out.theme()).key_column(0);
                for name in &names {
                    table.add_row(vec![name.clone()]);
                }
                out.table(&table);
            }
        }
        TimelineConfigCommands::Show { name } => {
            let config = if name == LAST {
                store
                    .load_last()?
                    .ok_or_else(|| JiraMetricsError::TimelineConfigNotFound {
                        name: LAST.to_string(),
                    })?
            } else {
                store.load(name)?
            };
            show(name, &config, out);
        }
        TimelineConfigCommands::Delete { name } => {
            store.delete(name)?;
            if out.is_json() {
                out.json(&serde_json::json!({ "deleted": name }));
            } else {
                out.success(&format!("Deleted timeline configuration '{name}'"));
            }
        }
    }
    Ok(())
}

fn show(name: &str, config: &TimelineConfig, out: &OutputContext) {
    if out.is_json() {
        out.json(config);
        return;
    }

    let mut panel = DetailPanel::new(format!("Timeline configuration {name}"), out.theme());
    for (label, value) in [
        ("Project", &config.project),
        ("JQL", &config.jql),
        ("Start", &config.start_date),
        ("End", &config.end_date),
    ] {
        if !value.is_empty() {
            panel.add(label, value.as_str());
        }
    }
    out.details(&panel);

    let mut statuses: Vec<(&String, &i64)> = config.status_order.iter().collect();
    statuses.sort_by_key(|(_, order)| **order);
    let mut table = DataTable::new(["Order", "Status", "Color"], out.theme()).status_column(1);
    for (status, order) in statuses {
        table.add_row(vec![
            order.to_string(),
            status.clone(),
            config.status_colors.get(status).cloned().unwrap_or_default(),
        ]);
    }
    if !table.is_empty() {
        out.table(&table);
    }
}

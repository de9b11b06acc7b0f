//! `jm query`: named JQL queries usable with `--query NAME`.

use super::Session;
use crate::cli::QueryCommands;
use crate::config::SavedQuery;
use crate::error::Result;
use crate::output::{DataTable, DetailPanel, OutputContext};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct Deleted<'a> {
    deleted: &'a str,
}

/// # Errors
///
/// Returns `QueryNotFound`, `QueryExists`, a validation error for a bad
/// name or empty JQL, or an I/O error from the queries file.
pub fn execute(command: &QueryCommands, session: &Session) -> Result<()> {
    let store = session.paths.queries();
    let out = &session.out;
    match command {
        QueryCommands::List => list(&store.list()?, out),
        QueryCommands::Show { name } => show(&store.get(name)?, out),
        QueryCommands::Add {
            name,
            jql,
            description,
        } => {
            let query = store.add(name, jql, description)?;
            info!(name = %query.name, "Saved query");
            saved(&query, "Saved", out);
        }
        QueryCommands::Update {
            name,
            jql,
            description,
        } => {
            let query = store.update(name, jql, description)?;
            info!(name = %query.name, "Updated query");
            saved(&query, "Updated", out);
        }
        QueryCommands::Delete { name } => {
            store.delete(name)?;
            if out.is_json() {
                out.json(&Deleted { deleted: name });
            } else {
                out.success(&format!("Deleted query '{name}'"));
            }
        }
    }
    Ok(())
}

fn saved(query: &SavedQuery, verb: &str, out: &OutputContext) {
    if out.is_json() {
        out.json(query);
    } else {
        out.success(&format!("{verb} query '{}'", query.name));
    }
}

fn list(queries: &[SavedQuery], out: &OutputContext) {
    if out.is_json() {
        out.json(&queries);
        return;
    }
    if queries.is_empty() {
        out.info("No saved queries");
        return;
    }
    let mut table = DataTable::new(["Name", "JQL", "Description"], out.theme())
        .title(format!("Saved queries ({})", queries.len()))
        .key_column(0);
    for query in queries {
        table.add_row(vec![
            query.name.clone(),
            query.jql.clone(),
            query.description.clone(),
        ]);
    }
    out.table(&table);
}

fn show(query: &SavedQuery, out: &OutputContext) {
    if out.is_json() {
        out.json(query);
        return;
    }
    let mut panel = DetailPanel::new(format!("Query {}", query.name), out.theme());
    panel.add("JQL", query.jql.as_str());
    if !query.description.is_empty() {
        panel.add("Description", query.description.as_str());
    }
    out.details(&panel);
}

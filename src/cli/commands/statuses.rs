use super::Session;
use crate::error::Result;
use crate::output::DataTable;
use serde::Serialize;

#[derive(Serialize)]
struct StatusesOutput<'a> {
    project: &'a str,
    statuses: &'a [String],
}

/// Status names across every issue type of `project`, in first-seen order.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the request fails.
pub fn execute(project: &str, session: &Session) -> Result<()> {
    let statuses = session.client()?.get_project_statuses(project)?;

    let out = &session.out;
    if out.is_json() {
        out.json(&StatusesOutput {
            project,
            statuses: &statuses,
        });
        return Ok(());
    }
    if statuses.is_empty() {
        out.info(&format!("No statuses found for {project}"));
        return Ok(());
    }

    let mut table = DataTable::new(["#", "Status"], out.theme())
        .title(format!("{project} statuses"))
        .status_column(1);
    for (idx, status) in statuses.iter().enumerate() {
        table.add_row(vec![(idx + 1).to_string(), status.clone()]);
    }
    out.table(&table);
    Ok(())
}

use super::Session;
use crate::error::Result;
use crate::output::DataTable;

/// # Errors
///
/// Returns an error if the client cannot be built or the request fails.
pub fn execute(session: &Session) -> Result<()> {
    let mut projects = session.client()?.get_all_projects()?;
    projects.sort_by(|a, b| a.key.cmp(&b.key));

    let out = &session.out;
    if out.is_json() {
        out.json(&projects);
        return Ok(());
    }
    if projects.is_empty() {
        out.info("No projects visible to this account");
        return Ok(());
    }

    let mut table = DataTable::new(["Key", "Name", "ID"], out.theme())
        .title(format!("Projects ({})", projects.len()))
        .key_column(0);
    for project in projects {
        table.add_row(vec![project.key, project.name, project.id]);
    }
    out.table(&table);
    Ok(())
}

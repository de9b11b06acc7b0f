//! `jm fields`: the field catalog, mostly to find ids for export profiles.

use super::Session;
use crate::cli::FieldsArgs;
use crate::error::Result;
use crate::model::FieldDef;
use crate::output::DataTable;

/// # Errors
///
/// Returns an error if the client cannot be built or the request fails.
pub fn execute(args: &FieldsArgs, session: &Session) -> Result<()> {
    let client = session.client()?;
    let mut defs = client.get_fields()?;
    defs.retain(|def| keep(def, args));
    defs.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    let out = &session.out;
    if out.is_json() {
        out.json(&defs);
        return Ok(());
    }
    if defs.is_empty() {
        out.info("No fields match");
        return Ok(());
    }

    let mut table = DataTable::new(["ID", "Name", "Custom"], out.theme())
        .title(format!("Fields ({})", defs.len()))
        .key_column(0);
    for def in &defs {
        table.add_row(vec![
            def.id.clone(),
            def.name.clone(),
            if def.custom { "yes" } else { "" }.to_string(),
        ]);
    }
    out.table(&table);
    Ok(())
}

fn keep(def: &FieldDef, args: &FieldsArgs) -> bool {
    if args.custom && !def.custom {
        return false;
    }
    args.filter.as_deref().is_none_or(|filter| {
        let filter = filter.to_lowercase();
        def.id.to_lowercase().contains(&filter) || def.name.to_lowercase().contains(&filter)
    })
}

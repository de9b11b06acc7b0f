//! `jm search`: run JQL and list the matching keys.

use super::Session;
use crate::cli::SearchArgs;
use crate::error::Result;
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct SearchOutput<'a> {
    jql: &'a str,
    total: u64,
    keys: &'a [String],
}

/// # Errors
///
/// Returns `MissingJql` without a query, or an error if the search fails.
pub fn execute(args: &SearchArgs, session: &Session) -> Result<()> {
    let jql = session.resolve_jql(&args.source)?;
    let result = session
        .client()?
        .search_jql(&jql, args.page_size, &["key"], false)?;
    info!(jql = %jql, found = result.keys.len(), total = result.total, "Search finished");

    let out = &session.out;
    if out.is_json() {
        out.json(&SearchOutput {
            jql: &jql,
            total: result.total,
            keys: &result.keys,
        });
        return Ok(());
    }

    for key in &result.keys {
        out.print(key);
    }
    if result.keys.is_empty() {
        out.info("No issues match");
    } else {
        out.info(&format!("{} issue(s)", result.keys.len()));
    }
    Ok(())
}

//! `jm recolor`: change segment colors in an existing report.

use super::Session;
use crate::cli::RecolorArgs;
use crate::error::{Result, ResultExt};
use crate::recolor::{collect_mapping, recolor_html};
use crate::util::atomic_write;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use tracing::info;

#[derive(Serialize)]
struct RecolorOutput<'a> {
    output: String,
    segments: usize,
    colors: &'a BTreeMap<String, String>,
}

/// # Errors
///
/// Returns an error for an unreadable report, invalid colors, or when no
/// colors are given at all.
pub fn execute(args: &RecolorArgs, session: &Session) -> Result<()> {
    let mapping = collect_mapping(args.color_file.as_deref(), &args.colors)?;
    let html = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let (updated, segments) = recolor_html(&html, &mapping);
    let target = args.output.as_ref().unwrap_or(&args.input);
    atomic_write(target, updated.as_bytes())?;
    info!(path = %target.display(), segments, statuses = mapping.len(), "Recolored report");

    let out = &session.out;
    if out.is_json() {
        out.json(&RecolorOutput {
            output: target.display().to_string(),
            segments,
            colors: &mapping,
        });
        return Ok(());
    }
    if segments == 0 {
        out.warning("No segments matched the given statuses");
    }
    out.success(&format!(
        "Recolored {segments} segment(s) in {}",
        target.display()
    ));
    Ok(())
}

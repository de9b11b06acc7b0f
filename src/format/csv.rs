//! CSV formatting for `jira_metrics`.
//!
//! Handles proper escaping of fields containing commas, quotes, or newlines.
//! Rows are written with `\r\n` line endings.

use std::fmt::Write as _;

/// Escape a CSV field value.
///
/// Wraps in double quotes if the value contains commas, quotes, or newlines.
/// Doubles any existing quotes within the value.
#[must_use]
pub fn escape_field(value: &str) -> String {
    let needs_quoting = value.contains(',')
        || value.contains('"')
        || value.contains('\n')
        || value.contains('\r');

    if needs_quoting {
        let escaped = value.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

/// Format one record.
#[must_use]
pub fn format_row<S: AsRef<str>>(cells: &[S]) -> String {
    cells
        .iter()
        .map(|cell| escape_field(cell.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Render a header row followed by data rows as a complete CSV document.
#[must_use]
pub fn to_csv_string<S: AsRef<str>>(headers: &[S], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    let _ = write!(out, "{}\r\n", format_row(headers));
    for row in rows {
        let _ = write!(out, "{}\r\n", format_row(row));
    }
    out
}

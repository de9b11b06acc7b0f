//! Recolor segments of an already generated timeline report.
//!
//! Segments are matched by the status name in their `title` attribute, so
//! reports produced by older versions (or edited by hand) still recolor as
//! long as the `status-segment` markup is intact.

use crate::error::{JiraMetricsError, Result, ResultExt};
use crate::format::unescape_html;
use crate::timeline::validate_color;
use crate::util::split_name_value;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static SEGMENT_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<[A-Za-z][^>]*\sclass="(?:[^"]*\s)?status-segment(?:\s[^"]*)?"[^>]*>"#)
        .expect("segment tag pattern")
});
static TITLE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\stitle="([^"]*)""#).expect("title pattern"));
static STYLE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\s)style="([^"]*)""#).expect("style pattern"));

const UNTRACKED_PREFIX: &str = "Untracked: ";
const REPLACED_PROPERTIES: [&str; 4] = ["background-color", "color", "font-weight", "text-shadow"];

/// The file written by the report's Export button.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColorFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, rename = "exportDate")]
    pub export_date: Option<String>,
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
}

/// Load and validate a color file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or holds an
/// invalid color.
pub fn load_color_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read color file {}", path.display()))?;
    let file: ColorFile = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid color file {}", path.display()))?;
    file.colors
        .iter()
        .map(|(status, color)| Ok((status.clone(), validate_color(status, color)?)))
        .collect()
}

/// Parse repeated `NAME=#RRGGBB` arguments.
///
/// # Errors
///
/// Returns an error for a malformed pair or an invalid color.
pub fn parse_color_args(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            let (status, color) = split_name_value(pair, "color")?;
            Ok((status.to_string(), validate_color(status, color)?))
        })
        .collect()
}

/// Status name a segment title refers to.
fn title_status(title: &str) -> &str {
    let title = title.strip_prefix(UNTRACKED_PREFIX).unwrap_or(title);
    title.split_once(": ").map_or(title, |(status, _)| status).trim()
}

fn recolored_style(existing: &str, color: &str) -> String {
    let mut declarations: Vec<&str> = existing
        .split(';')
        .map(str::trim)
        .filter(|decl| !decl.is_empty())
        .filter(|decl| {
            let property = decl.split(':').next().unwrap_or_default().trim();
            !REPLACED_PROPERTIES
                .iter()
                .any(|replaced| property.eq_ignore_ascii_case(replaced))
        })
        .collect();
    let colored = format!(
        "background-color: {color}; color: #ffffff; font-weight: bold; text-shadow: 1px 1px 2px rgba(0,0,0,0.5)"
    );
    declarations.push(&colored);
    format!("{};", declarations.join("; "))
}

/// Apply `mapping` (status name → color) to every matching segment.
///
/// Returns the rewritten document and how many segments changed.
#[must_use]
pub fn recolor_html(html: &str, mapping: &BTreeMap<String, String>) -> (String, usize) {
    let mut changed = 0;
    let output = SEGMENT_TAG.replace_all(html, |caps: &Captures<'_>| {
        let tag = &caps[0];
        let Some(title) = TITLE_ATTR.captures(tag).map(|c| unescape_html(&c[1])) else {
            return tag.to_string();
        };
        let Some(color) = mapping.get(title_status(&title)) else {
            return tag.to_string();
        };
        changed += 1;

        if let Some(style) = STYLE_ATTR.captures(tag) {
            let replacement = format!(
                "{}style=\"{}\"",
                &style[1],
                recolored_style(&style[2], color)
            );
            STYLE_ATTR.replace(tag, regex::NoExpand(&replacement)).into_owned()
        } else {
            let insert_at = tag.len() - if tag.ends_with("/>") { 2 } else { 1 };
            format!(
                "{} style=\"{}\"{}",
                tag[..insert_at].trim_end(),
                recolored_style("", color),
                &tag[insert_at..]
            )
        }
    });
    let output = output.into_owned();
    debug!(changed, statuses = mapping.len(), "Recolored report");
    (output, changed)
}

/// Merge the color file (if any) with `--color` pairs; pairs win.
///
/// # Errors
///
/// Returns an error for an unreadable file, a bad pair or an empty mapping.
pub fn collect_mapping(file: Option<&Path>, pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut mapping = match file {
        Some(path) => load_color_file(path)?,
        None => BTreeMap::new(),
    };
    mapping.extend(parse_color_args(pairs)?);
    if mapping.is_empty() {
        return Err(JiraMetricsError::validation(
            "color",
            "no colors given; pass --color NAME=#RRGGBB or --colors FILE",
        ));
    }
    Ok(mapping)
}

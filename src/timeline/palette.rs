//! Status colors: the red-to-green progression and `#RRGGBB` validation.

use crate::error::{JiraMetricsError, Result};

const SINGLE: &str = "#36B37E";
const PAIR: [&str; 2] = ["#E53935", "#43A047"];

/// Curated progression from early (red) to done (dark green).
const PROGRESSION: [&str; 8] = [
    "#D32F2F", "#F4511E", "#FB8C00", "#FDD835", "#C0CA33", "#7CB342", "#43A047", "#2E7D32",
];

const ANCHORS: [(u8, u8, u8); 8] = [
    (211, 47, 47),
    (244, 81, 30),
    (251, 140, 0),
    (253, 216, 53),
    (192, 202, 51),
    (124, 179, 66),
    (67, 160, 71),
    (46, 125, 50),
];

/// `n` distinct colors ordered from first to last workflow step.
#[must_use]
pub fn generate_color_palette(n: usize) -> Vec<String> {
    match n {
        0 => Vec::new(),
        1 => vec![SINGLE.to_string()],
        2 => PAIR.iter().map(|c| (*c).to_string()).collect(),
        n if n <= PROGRESSION.len() => {
            let step = PROGRESSION.len() as f64 / n as f64;
            let mut indices: Vec<usize> = (0..n).map(|i| (i as f64 * step) as usize).collect();
            if let Some(last) = indices.last_mut() {
                *last = PROGRESSION.len() - 1;
            }
            indices
                .into_iter()
                .map(|idx| PROGRESSION[idx].to_string())
                .collect()
        }
        n => (0..n).map(|i| interpolated(i, n)).collect(),
    }
}

fn interpolated(i: usize, n: usize) -> String {
    let last = ANCHORS.len() - 1;
    let position = i as f64 * last as f64 / (n - 1) as f64;
    let segment = position as usize;
    if segment >= last {
        let (r, g, b) = ANCHORS[last];
        return to_hex(r, g, b);
    }
    let factor = position - segment as f64;
    let (r0, g0, b0) = ANCHORS[segment];
    let (r1, g1, b1) = ANCHORS[segment + 1];
    let mix = |from: u8, to: u8| (f64::from(from) + (f64::from(to) - f64::from(from)) * factor) as u8;
    to_hex(mix(r0, r1), mix(g0, g1), mix(b0, b1))
}

fn to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{r:02X}{g:02X}{b:02X}")
}

/// Check a `#RRGGBB` color and return it upper-cased.
///
/// # Errors
///
/// Returns `InvalidColor` naming `status` when the value is malformed.
pub fn validate_color(status: &str, color: &str) -> Result<String> {
    let trimmed = color.trim();
    let valid = trimmed.len() == 7
        && trimmed.starts_with('#')
        && trimmed[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(trimmed.to_ascii_uppercase())
    } else {
        Err(JiraMetricsError::InvalidColor {
            status: status.to_string(),
            color: color.to_string(),
        })
    }
}

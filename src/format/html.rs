//! HTML entity helpers for report generation and recoloring.

/// Escape text for use in element content and double-quoted attributes.
#[must_use]
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Decode the named entities produced by [`escape_html`] plus numeric references.
#[must_use]
pub fn unescape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match tail.find(';').filter(|end| *end <= 10) {
            Some(end) => {
                let entity = &tail[1..end];
                if let Some(decoded) = decode_entity(entity) {
                    out.push(decoded);
                } else {
                    out.push_str(&tail[..=end]);
                }
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"R&D\" isn't</b>"),
            "&lt;b&gt;&quot;R&amp;D&quot; isn&#x27;t&lt;/b&gt;"
        );
    }

    #[test]
    fn test_unescape_inverts_escape() {
        let raw = "Untracked: Won't Fix <R&D> \"x\"";
        assert_eq!(unescape_html(&escape_html(raw)), raw);
    }

    #[test]
    fn test_unescape_numeric_and_unknown() {
        assert_eq!(unescape_html("a&#39;b&#x41;"), "a'bA");
        assert_eq!(unescape_html("fish & chips"), "fish & chips");
        assert_eq!(unescape_html("&bogus;"), "&bogus;");
    }
}

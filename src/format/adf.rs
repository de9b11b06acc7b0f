//! Atlassian Document Format (ADF) to Markdown.
//!
//! Jira stores descriptions and comment bodies as an ADF JSON tree. The
//! converter walks block nodes, then inline nodes with their marks, and
//! produces GitHub-flavoured Markdown with minimal escaping.

use chrono::DateTime;
use serde_json::Value;

const ESCAPED: &str = "\\`*_{}[]()#+-|!>";

/// How emoji nodes are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmojiStyle {
    #[default]
    Unicode,
    Shortcode,
}

/// Rendering options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdfOptions {
    /// Render a paragraph that is entirely bold text as a heading.
    pub promote_strong_paragraphs_to_headings: bool,
    /// Level used for promoted headings (clamped to 1..=6).
    pub heading_level: u8,
    pub emoji_style: EmojiStyle,
    /// Spaces per nesting level in lists.
    pub list_indent_spaces: usize,
    pub ensure_trailing_newline: bool,
}

impl Default for AdfOptions {
    fn default() -> Self {
        Self {
            promote_strong_paragraphs_to_headings: true,
            heading_level: 2,
            emoji_style: EmojiStyle::Unicode,
            list_indent_spaces: 2,
            ensure_trailing_newline: true,
        }
    }
}

impl AdfOptions {
    /// Options used for issue descriptions.
    #[must_use]
    pub fn for_description() -> Self {
        Self::default()
    }

    /// Options used for comment bodies: no heading promotion, level 4.
    #[must_use]
    pub fn for_comments() -> Self {
        Self {
            promote_strong_paragraphs_to_headings: false,
            heading_level: 4,
            ..Self::default()
        }
    }

    fn clamped_level(&self) -> usize {
        usize::from(self.heading_level.clamp(1, 6))
    }
}

/// Convert a description or comment body value to Markdown.
///
/// `null` becomes an empty string, an ADF `doc` is converted, a plain string
/// is normalised, and any other JSON is emitted as compact JSON text.
#[must_use]
pub fn normalize_to_markdown(value: &Value, options: &AdfOptions) -> String {
    let newline = if options.ensure_trailing_newline { "\n" } else { "" };
    match value {
        Value::Null => String::new(),
        Value::Object(map) if map.get("type").and_then(Value::as_str) == Some("doc") => {
            doc_to_markdown(value, options)
        }
        Value::String(text) => {
            let mut out = text.replace("\r\n", "\n").trim_end().to_string();
            out.push_str(newline);
            out
        }
        other => format!("{other}{newline}"),
    }
}

fn content(node: &Value) -> &[Value] {
    node.get("content")
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

fn attr<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    node.get("attrs").and_then(|attrs| attrs.get(key))
}

fn attr_str<'a>(node: &'a Value, key: &str) -> Option<&'a str> {
    attr(node, key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

fn node_type(node: &Value) -> &str {
    node.get("type").and_then(Value::as_str).unwrap_or("")
}

fn doc_to_markdown(doc: &Value, options: &AdfOptions) -> String {
    let blocks: Vec<String> = content(doc)
        .iter()
        .map(|node| block_to_markdown(node, options, 0))
        .filter(|block| !block.is_empty())
        .map(|block| block.trim_end().to_string())
        .collect();

    let mut out = normalize_blank_lines(&blocks.join("\n\n"));
    if options.ensure_trailing_newline && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn block_to_markdown(node: &Value, options: &AdfOptions, depth: usize) -> String {
    match node_type(node) {
        "paragraph" => {
            let text = inline_to_markdown(content(node), options);
            if options.promote_strong_paragraphs_to_headings && is_strong_only_paragraph(node) {
                format!("{} {}", "#".repeat(options.clamped_level()), text.trim())
            } else {
                text.trim().to_string()
            }
        }
        "heading" => {
            let level = attr(node, "level")
                .and_then(Value::as_i64)
                .unwrap_or(2)
                .clamp(1, 6) as usize;
            let text = inline_to_markdown(content(node), options);
            format!("{} {}", "#".repeat(level), text.trim())
        }
        "bulletList" => content(node)
            .iter()
            .flat_map(|item| list_item(item, options, depth, None))
            .collect::<Vec<_>>()
            .join("\n"),
        "orderedList" => {
            let start = attr(node, "order")
                .and_then(Value::as_u64)
                .filter(|order| *order > 0)
                .unwrap_or(1);
            content(node)
                .iter()
                .enumerate()
                .flat_map(|(idx, item)| list_item(item, options, depth, Some(start + idx as u64)))
                .collect::<Vec<_>>()
                .join("\n")
        }
        "blockquote" => content(node)
            .iter()
            .map(|child| block_to_markdown(child, options, depth))
            .filter(|block| !block.is_empty())
            .map(|block| quote_lines(&block))
            .collect::<Vec<_>>()
            .join("\n\n"),
        "rule" => "---".to_string(),
        "codeBlock" => {
            let language = attr_str(node, "language").unwrap_or("");
            let code = plain_text(content(node));
            format!("```{language}\n{code}\n```")
        }
        "panel" => {
            let label = attr_str(node, "panelType")
                .map_or_else(|| "[panel]".to_string(), |kind| format!("[{kind}]"));
            let inner = content(node)
                .iter()
                .map(|child| block_to_markdown(child, options, depth))
                .filter(|block| !block.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n");
            quote_lines(&format!("{label} {inner}"))
        }
        "mediaSingle" | "mediaGroup" | "media" => "![attachment](attachment)".to_string(),
        "table" => table_to_markdown(node, options),
        "taskList" => {
            let indent = " ".repeat(options.list_indent_spaces * depth);
            content(node)
                .iter()
                .map(|item| {
                    let done = attr_str(item, "state") == Some("DONE");
                    let text = content(item)
                        .iter()
                        .filter(|child| node_type(child) == "paragraph")
                        .map(|child| inline_to_markdown(content(child), options).trim().to_string())
                        .last()
                        .unwrap_or_default();
                    let checkbox = if done { "[x]" } else { "[ ]" };
                    format!("{indent}- {checkbox} {text}")
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        _ if node.get("content").is_some() => content(node)
            .iter()
            .map(|child| block_to_markdown(child, options, depth))
            .filter(|block| !block.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n"),
        _ => String::new(),
    }
}

fn quote_lines(block: &str) -> String {
    let lines: Vec<&str> = block.lines().collect();
    if lines.is_empty() {
        return "> ".to_string();
    }
    lines
        .iter()
        .map(|line| format!("> {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn list_item(node: &Value, options: &AdfOptions, depth: usize, number: Option<u64>) -> Vec<String> {
    let indent = " ".repeat(options.list_indent_spaces * depth);
    let bullet = number.map_or_else(|| "- ".to_string(), |n| format!("{n}. "));
    let continuation = " ".repeat(bullet.chars().count());
    let mut lines = Vec::new();
    let mut first_line_done = false;

    for child in content(node) {
        let text = match node_type(child) {
            "paragraph" => inline_to_markdown(content(child), options).trim().to_string(),
            "bulletList" | "orderedList" | "taskList" => {
                let nested = block_to_markdown(child, options, depth + 1);
                if !nested.is_empty() {
                    lines.push(nested);
                }
                continue;
            }
            _ => {
                let block = block_to_markdown(child, options, depth);
                if block.is_empty() {
                    continue;
                }
                block
            }
        };
        if first_line_done {
            lines.push(format!("{indent}{continuation}{text}"));
        } else {
            lines.push(format!("{indent}{bullet}{text}"));
            first_line_done = true;
        }
    }

    if !first_line_done {
        lines.push(format!("{indent}{bullet}"));
    }
    lines
}

fn inline_to_markdown(nodes: &[Value], options: &AdfOptions) -> String {
    let mut out = String::new();
    for node in nodes {
        match node_type(node) {
            "text" => {
                let text = node.get("text").and_then(Value::as_str).unwrap_or("");
                let marks = node
                    .get("marks")
                    .and_then(Value::as_array)
                    .map_or(&[][..], Vec::as_slice);
                out.push_str(&apply_marks(text, marks));
            }
            "hardBreak" => out.push('\n'),
            "emoji" => out.push_str(&render_emoji(node, options.emoji_style)),
            "mention" => {
                let label = attr_str(node, "text")
                    .or_else(|| attr_str(node, "id"))
                    .unwrap_or("mention");
                out.push('@');
                out.push_str(label);
            }
            "inlineCard" | "blockCard" => {
                let data = attr(node, "data");
                let url = attr_str(node, "url").or_else(|| {
                    data.and_then(|d| d.get("url"))
                        .and_then(Value::as_str)
                        .filter(|url| !url.is_empty())
                });
                match url {
                    Some(url) => {
                        let title = data
                            .and_then(|d| d.get("name"))
                            .and_then(Value::as_str)
                            .filter(|name| !name.is_empty())
                            .unwrap_or(url);
                        out.push_str(&format!("[{}]({url})", escape_markdown(title)));
                    }
                    None => out.push_str("[card]"),
                }
            }
            "date" => out.push_str(&render_date(attr(node, "timestamp"))),
            "status" => {
                let text = escape_markdown(attr_str(node, "text").unwrap_or(""));
                match attr_str(node, "color") {
                    Some(color) => out.push_str(&format!("[status: {text} ({color})]")),
                    None => out.push_str(&format!("[status: {text}]")),
                }
            }
            _ => {
                let text = node.get("text").and_then(Value::as_str).unwrap_or("");
                out.push_str(&escape_markdown(text));
            }
        }
    }
    out
}

fn render_date(timestamp: Option<&Value>) -> String {
    let millis = match timestamp {
        Some(Value::String(raw)) if raw.is_empty() => return "[date]".to_string(),
        Some(Value::String(raw)) => raw.trim().parse::<i64>().map_err(|_| raw.clone()),
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| n.to_string()),
        _ => return "[date]".to_string(),
    };
    match millis {
        Ok(ms) => DateTime::from_timestamp_millis(ms).map_or_else(
            || escape_markdown(&ms.to_string()),
            |dt| dt.format("%Y-%m-%d").to_string(),
        ),
        Err(raw) => escape_markdown(&raw),
    }
}

fn is_strong_only_paragraph(node: &Value) -> bool {
    let [only] = content(node) else {
        return false;
    };
    if node_type(only) != "text" {
        return false;
    }
    if only
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .is_empty()
    {
        return false;
    }
    let marks = only
        .get("marks")
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice);
    !marks.is_empty() && marks.iter().all(|mark| node_type(mark) == "strong")
}

fn apply_marks(text: &str, marks: &[Value]) -> String {
    if marks.is_empty() {
        return escape_markdown(text);
    }
    if marks.iter().any(|mark| node_type(mark) == "code") {
        return format!("`{}`", text.replace('`', "\\`"));
    }

    let mut wrapped = escape_markdown(text);
    if let Some(link) = marks.iter().find(|mark| node_type(mark) == "link") {
        if let Some(href) = attr_str(link, "href") {
            wrapped = match attr_str(link, "title") {
                Some(title) => format!("[{wrapped}]({href} \"{}\")", title.replace('"', "\\\"")),
                None => format!("[{wrapped}]({href})"),
            };
        }
    }

    let has = |kind: &str| marks.iter().any(|mark| node_type(mark) == kind);
    if has("strong") {
        wrapped = format!("**{wrapped}**");
    }
    if has("em") {
        wrapped = format!("_{wrapped}_");
    }
    if has("strike") {
        wrapped = format!("~~{wrapped}~~");
    }
    wrapped
}

/// Backslash-escape Markdown control characters.
#[must_use]
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ESCAPED.contains(ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn render_emoji(node: &Value, style: EmojiStyle) -> String {
    let text = attr_str(node, "text").or_else(|| attr_str(node, "shortName"));
    if style == EmojiStyle::Shortcode {
        return text.unwrap_or("").to_string();
    }
    match attr_str(node, "id") {
        Some("atlassian-plus") => return "\u{2795}".to_string(),
        Some("atlassian-warning") => return "\u{26a0}\u{fe0f}".to_string(),
        _ => {}
    }
    match attr_str(node, "shortName").map(|s| s.trim_matches(':')) {
        Some("plus") => "\u{2795}".to_string(),
        Some("warning") => "\u{26a0}\u{fe0f}".to_string(),
        _ => text.unwrap_or("\u{1f642}").to_string(),
    }
}

fn plain_text(nodes: &[Value]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node_type(node) {
            "text" => out.push_str(node.get("text").and_then(Value::as_str).unwrap_or("")),
            "hardBreak" => out.push('\n'),
            _ => {}
        }
    }
    out
}

fn table_to_markdown(node: &Value, options: &AdfOptions) -> String {
    let rows = content(node);
    let Some(first_row) = rows.first() else {
        return String::new();
    };

    let render_cell = |cell: &Value| -> String {
        content(cell)
            .iter()
            .filter(|child| node_type(child) == "paragraph")
            .map(|child| inline_to_markdown(content(child), options).trim().to_string())
            .collect()
    };

    let mut lines: Vec<String> = rows
        .iter()
        .map(|row| {
            let cells: Vec<String> = content(row).iter().map(render_cell).collect();
            format!("| {} |", cells.join(" | "))
        })
        .collect();

    let header_cells = content(first_row);
    if header_cells
        .iter()
        .any(|cell| node_type(cell) == "tableHeader")
    {
        let separator = vec!["---"; header_cells.len()].join(" | ");
        lines.insert(1, format!("| {separator} |"));
    }
    lines.join("\n")
}

fn normalize_blank_lines(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut previous_blank = false;
    for line in text.split('\n') {
        let line = line.trim_end();
        if line.is_empty() {
            if !previous_blank {
                out.push("");
            }
            previous_blank = true;
        } else {
            out.push(line);
            previous_blank = false;
        }
    }
    out.join("\n")
}

//! Text renderings of Jira data.
//!
//! - [`adf`] converts Atlassian Document Format trees to Markdown
//! - [`fields`] flattens field values into CSV cells
//! - [`csv`] quotes and joins records
//! - [`html`] escapes report text
//! - [`markdown`] builds the per-issue Markdown export

pub mod adf;
pub mod csv;
pub mod fields;
pub mod html;
pub mod markdown;

pub use adf::{AdfOptions, EmojiStyle, escape_markdown, normalize_to_markdown};
pub use fields::format_field_value;
pub use html::{escape_html, unescape_html};
pub use markdown::issue_markdown;

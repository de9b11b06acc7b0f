//! Theme and color definitions for rich output.

use rich_rust::r#box::ROUNDED;
use rich_rust::prelude::*;

fn colored(name: &str) -> Style {
    Color::parse(name).map_or_else(|_| Style::new(), |color| Style::new().color(color))
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub success: Style,
    pub error: Style,
    pub warning: Style,
    pub info: Style,
    pub dimmed: Style,
    pub accent: Style,
    pub muted: Style,
    pub emphasis: Style,

    pub issue_key: Style,
    pub status: Style,
    pub status_done: Style,
    pub field_id: Style,
    pub secret: Style,

    pub table_header: Style,
    pub table_border: Style,
    pub panel_title: Style,
    pub panel_border: Style,
    pub section: Style,
    pub label: Style,
    pub timestamp: Style,
    pub username: Style,

    pub box_style: &'static BoxChars,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            success: colored("green").bold(),
            error: colored("red").bold(),
            warning: colored("yellow").bold(),
            info: colored("blue"),
            dimmed: Style::new().dim(),
            accent: colored("cyan"),
            muted: colored("bright_black"),
            emphasis: Style::new().bold(),

            issue_key: colored("cyan").bold(),
            status: colored("yellow"),
            status_done: colored("green"),
            field_id: colored("magenta"),
            secret: colored("bright_black").italic(),

            table_header: Style::new().bold(),
            table_border: colored("bright_black"),
            panel_title: Style::new().bold(),
            panel_border: colored("bright_black"),
            section: colored("cyan").bold(),
            label: colored("cyan").dim(),
            timestamp: colored("bright_black"),
            username: colored("green"),

            box_style: &ROUNDED,
        }
    }
}

impl Theme {
    /// Style for a Jira status name. Finished-looking statuses render green.
    #[must_use]
    pub fn status_style(&self, status: &str) -> Style {
        let lower = status.to_lowercase();
        if ["done", "closed", "resolved", "released"]
            .iter()
            .any(|word| lower.contains(word))
        {
            self.status_done.clone()
        } else {
            self.status.clone()
        }
    }
}

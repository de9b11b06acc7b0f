use crate::output::Theme;
use rich_rust::prelude::*;
use rich_rust::renderables::Cell;

/// Label/value pairs under a title (account details, effective config).
pub struct DetailPanel<'a> {
    title: String,
    entries: Vec<(String, String)>,
    theme: &'a Theme,
}

impl<'a> DetailPanel<'a> {
    pub fn new(title: impl Into<String>, theme: &'a Theme) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
            theme,
        }
    }

    pub fn add(&mut self, label: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.entries.push((label.into(), value.into()));
        self
    }

    #[must_use]
    pub fn build(&self) -> Table {
        let mut table = Table::new()
            .box_style(self.theme.box_style)
            .border_style(self.theme.panel_border.clone())
            .title(Text::styled(&self.title, self.theme.panel_title.clone()))
            .with_column(Column::new("Setting").min_width(12))
            .with_column(Column::new("Value"));

        for (label, value) in &self.entries {
            table.add_row(Row::new(vec![
                Cell::new(Text::styled(label, self.theme.label.clone())),
                Cell::new(Text::new(value)),
            ]));
        }
        table
    }

    /// `label: value` lines.
    #[must_use]
    pub fn to_plain(&self) -> String {
        self.entries
            .iter()
            .map(|(label, value)| format!("{label}: {value}\n"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_lines() {
        let theme = Theme::default();
        let mut panel = DetailPanel::new("Account", &theme);
        panel.add("Name", "Ann").add("Email", "ann@example.com");
        assert_eq!(panel.to_plain(), "Name: Ann\nEmail: ann@example.com\n");
    }
}

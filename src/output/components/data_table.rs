use crate::output::Theme;
use rich_rust::prelude::*;
use rich_rust::renderables::Cell;
use std::fmt::Write as _;

const MAX_CELL_CHARS: usize = 60;

/// A titled table of string cells, rendered rich or as tab-separated text.
pub struct DataTable<'a> {
    theme: &'a Theme,
    title: Option<String>,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    key_column: Option<usize>,
    status_column: Option<usize>,
}

impl<'a> DataTable<'a> {
    #[must_use]
    pub fn new<I, S>(headers: I, theme: &'a Theme) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            theme,
            title: None,
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            key_column: None,
            status_column: None,
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Highlight this column as an issue key or identifier.
    #[must_use]
    pub const fn key_column(mut self, index: usize) -> Self {
        self.key_column = Some(index);
        self
    }

    /// Color this column by status name.
    #[must_use]
    pub const fn status_column(mut self, index: usize) -> Self {
        self.status_column = Some(index);
        self
    }

    pub fn add_row(&mut self, cells: Vec<String>) -> &mut Self {
        self.rows.push(cells);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn cell_style(&self, index: usize, value: &str) -> Style {
        if self.key_column == Some(index) {
            self.theme.issue_key.clone()
        } else if self.status_column == Some(index) {
            self.theme.status_style(value)
        } else {
            Style::new()
        }
    }

    #[must_use]
    pub fn build(&self) -> Table {
        let mut table = Table::new()
            .box_style(self.theme.box_style)
            .border_style(self.theme.table_border.clone())
            .header_style(self.theme.table_header.clone());

        if let Some(ref title) = self.title {
            table = table.title(Text::new(title));
        }
        for header in &self.headers {
            table = table.with_column(Column::new(header.as_str()).max_width(MAX_CELL_CHARS));
        }

        for row in &self.rows {
            let cells: Vec<Cell> = row
                .iter()
                .enumerate()
                .map(|(idx, value)| {
                    Cell::new(Text::new(truncate(value))).style(self.cell_style(idx, value))
                })
                .collect();
            table.add_row(Row::new(cells));
        }
        table
    }

    /// Header and rows as tab-separated lines.
    #[must_use]
    pub fn to_plain(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.headers.join("\t"));
        for row in &self.rows {
            let _ = writeln!(out, "{}", row.join("\t"));
        }
        out
    }
}

fn truncate(value: &str) -> String {
    if value.chars().count() > MAX_CELL_CHARS {
        let mut short: String = value.chars().take(MAX_CELL_CHARS - 3).collect();
        short.push_str("...");
        short
    } else {
        value.to_string()
    }
}

use super::{DataTable, DetailPanel, Theme};
use crate::cli::Cli;
use rich_rust::prelude::*;
use rich_rust::renderables::Renderable;
use std::io::IsTerminal;

/// Central output coordinator that respects json/quiet/plain modes.
pub struct OutputContext {
    /// Rich console for human-readable output
    console: Console,
    theme: Theme,
    mode: OutputMode,
    /// Terminal width (cached)
    width: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Full rich formatting (tables, colors, panels)
    Rich,
    /// Plain text, no ANSI codes (for piping)
    Plain,
    /// JSON output only
    Json,
    /// Minimal output (quiet mode)
    Quiet,
}

impl OutputContext {
    /// Create from CLI global args
    #[must_use]
    pub fn from_args(args: &Cli) -> Self {
        Self::from_flags(args.json, args.quiet, args.no_color)
    }

    #[must_use]
    pub fn from_flags(json: bool, quiet: bool, no_color: bool) -> Self {
        let mode = Self::detect_mode(
            json,
            quiet,
            no_color || std::env::var_os("NO_COLOR").is_some(),
            std::io::stdout().is_terminal(),
        );
        Self::with_mode(mode)
    }

    #[must_use]
    pub fn with_mode(mode: OutputMode) -> Self {
        let console = match mode {
            OutputMode::Rich => Console::new(),
            OutputMode::Plain | OutputMode::Quiet | OutputMode::Json => {
                Console::builder().no_color().force_terminal(false).build()
            }
        };
        let width = console.width();
        Self {
            console,
            theme: Theme::default(),
            mode,
            width,
        }
    }

    const fn detect_mode(json: bool, quiet: bool, no_color: bool, tty: bool) -> OutputMode {
        if json {
            OutputMode::Json
        } else if quiet {
            OutputMode::Quiet
        } else if no_color || !tty {
            OutputMode::Plain
        } else {
            OutputMode::Rich
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Mode Checks
    // ─────────────────────────────────────────────────────────────

    #[must_use]
    pub const fn mode(&self) -> OutputMode {
        self.mode
    }
    #[must_use]
    pub fn is_rich(&self) -> bool {
        self.mode == OutputMode::Rich
    }
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.mode == OutputMode::Quiet
    }
    #[must_use]
    pub fn is_plain(&self) -> bool {
        self.mode == OutputMode::Plain
    }
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }
    #[must_use]
    pub const fn theme(&self) -> &Theme {
        &self.theme
    }

    // ─────────────────────────────────────────────────────────────
    // Output Methods
    // ─────────────────────────────────────────────────────────────

    pub fn print(&self, content: &str) {
        match self.mode {
            OutputMode::Rich => self.console.print(content),
            OutputMode::Plain => println!("{content}"),
            OutputMode::Quiet | OutputMode::Json => {}
        }
    }

    /// Print text verbatim in every mode except JSON (exported CSV, scripts).
    pub fn raw(&self, content: &str) {
        if !self.is_json() {
            print!("{content}");
        }
    }

    pub fn render<R: Renderable>(&self, renderable: &R) {
        if self.is_rich() {
            self.console.print_renderable(renderable);
        }
    }

    /// Rich table on a terminal, tab-separated lines when plain.
    pub fn table(&self, table: &DataTable<'_>) {
        match self.mode {
            OutputMode::Rich => self.console.print_renderable(&table.build()),
            OutputMode::Plain => print!("{}", table.to_plain()),
            OutputMode::Quiet | OutputMode::Json => {}
        }
    }

    pub fn details(&self, panel: &DetailPanel<'_>) {
        match self.mode {
            OutputMode::Rich => self.console.print_renderable(&panel.build()),
            OutputMode::Plain => print!("{}", panel.to_plain()),
            OutputMode::Quiet | OutputMode::Json => {}
        }
    }

    pub fn json<T: serde::Serialize>(&self, value: &T) {
        if self.is_json() {
            if let Ok(json) = serde_json::to_string(value) {
                println!("{json}");
            }
        }
    }

    pub fn json_pretty<T: serde::Serialize>(&self, value: &T) {
        if self.is_json() {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{json}");
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Semantic Output Methods
    // ─────────────────────────────────────────────────────────────

    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Rich => {
                self.console.print(&format!("[bold green]✓[/] {message}"));
            }
            OutputMode::Plain => println!("✓ {message}"),
            OutputMode::Quiet | OutputMode::Json => {}
        }
    }

    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Rich => {
                self.console
                    .print(&format!("[bold yellow]⚠[/] [yellow]{message}[/]"));
            }
            OutputMode::Plain => eprintln!("Warning: {message}"),
            OutputMode::Quiet | OutputMode::Json => {}
        }
    }

    pub fn info(&self, message: &str) {
        match self.mode {
            OutputMode::Rich => {
                self.console.print(&format!("[blue]ℹ[/] {message}"));
            }
            OutputMode::Plain => println!("{message}"),
            OutputMode::Quiet | OutputMode::Json => {}
        }
    }

    pub fn section(&self, title: &str) {
        if self.is_rich() {
            let rule = Rule::with_title(Text::new(title));
            self.console.print_renderable(&rule);
        } else if self.is_plain() {
            println!("\n─── {title} ───\n");
        }
    }

    pub fn newline(&self) {
        if !self.is_quiet() && !self.is_json() {
            println!();
        }
    }

    pub fn error_panel(&self, title: &str, description: &str, suggestions: &[&str]) {
        match self.mode {
            OutputMode::Rich => {
                let mut text = Text::from(description);
                if !suggestions.is_empty() {
                    text.append("\n\nSuggestions:\n");
                    for suggestion in suggestions {
                        text.append(&format!("• {suggestion}\n"));
                    }
                }
                let panel = Panel::from_rich_text(&text, self.width).title(Text::new(title));
                self.console.print_renderable(&panel);
            }
            OutputMode::Plain => {
                eprintln!("Error: {title} - {description}");
                for suggestion in suggestions {
                    eprintln!("  Suggestion: {suggestion}");
                }
            }
            OutputMode::Quiet => eprintln!("Error: {description}"),
            OutputMode::Json => {}
        }
    }
}

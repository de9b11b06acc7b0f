//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// Jira issue exports, status timelines and sprint reports
#[derive(Parser, Debug)]
#[command(name = "jm", author, version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Jira base URL (overrides saved credentials and config)
    #[arg(long, global = true, value_name = "URL")]
    pub url: Option<String>,

    /// Account email
    #[arg(long, global = true)]
    pub email: Option<String>,

    /// API token
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Concurrent issue downloads
    #[arg(long, global = true, value_name = "N")]
    pub workers: Option<usize>,

    /// HTTP timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify credentials and save them for later runs
    Login(LoginArgs),

    /// Show the authenticated account
    Whoami,

    /// List field definitions
    Fields(FieldsArgs),

    /// List projects
    Projects,

    /// List the statuses used by a project
    Statuses {
        /// Project key
        project: String,
    },

    /// Run a JQL search and list matching keys
    Search(SearchArgs),

    /// Export issues
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },

    /// Generate an HTML status timeline report
    Timeline(TimelineArgs),

    /// Analyze status transitions within a sprint
    Sprint(SprintArgs),

    /// Recolor segments of an existing timeline report
    Recolor(RecolorArgs),

    /// Manage saved JQL queries
    Query {
        #[command(subcommand)]
        command: QueryCommands,
    },

    /// Manage CSV export profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Manage saved timeline configurations
    TimelineConfig {
        #[command(subcommand)]
        command: TimelineConfigCommands,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completions(CompletionsArgs),

    /// Show version information
    Version,
}

/// Where the JQL comes from: inline or a saved query.
#[derive(Args, Debug, Clone, Default)]
pub struct JqlArgs {
    /// JQL query string
    #[arg(long)]
    pub jql: Option<String>,

    /// Name of a saved query to use instead of --jql
    #[arg(long, conflicts_with = "jql", value_name = "NAME")]
    pub query: Option<String>,
}

/// `jm login` reads the connection from the global `--url`, `--email` and
/// `--token` flags (or their environment and config fallbacks).
#[derive(Args, Debug, Clone, Default)]
pub struct LoginArgs {
    /// Save without testing the connection
    #[arg(long)]
    pub no_verify: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FieldsArgs {
    /// Only custom fields
    #[arg(long)]
    pub custom: bool,

    /// Case-insensitive filter on id or name
    #[arg(long, value_name = "TEXT")]
    pub filter: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    #[command(flatten)]
    pub source: JqlArgs,

    /// Keys per search page
    #[arg(long, default_value_t = 100)]
    pub page_size: u64,
}

#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// One CSV row per issue with selected fields and metrics
    Csv(ExportCsvArgs),

    /// One JSON and one Markdown file per issue
    Json(ExportJsonArgs),
}

/// Inline export profile settings; also used by `profile save`.
#[derive(Args, Debug, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ProfileArgs {
    /// Field id or display name to include (repeatable)
    #[arg(long = "field", value_name = "FIELD")]
    pub fields: Vec<String>,

    /// Transition rule NAME=STATUS>STATUS[>...] (repeatable)
    #[arg(long = "rule", value_name = "RULE")]
    pub rules: Vec<String>,

    /// Add hours spent in each status
    #[arg(long)]
    pub time_in_status: bool,

    /// Add the number of comments
    #[arg(long)]
    pub comment_count: bool,

    /// Add the total comment length
    #[arg(long)]
    pub comment_length: bool,

    /// Add the number of distinct commenters
    #[arg(long)]
    pub commenter_count: bool,

    /// Business day start (HH:MM); enables business-hours time in status
    #[arg(long, value_name = "HH:MM", requires = "business_end")]
    pub business_start: Option<String>,

    /// Business day end (HH:MM)
    #[arg(long, value_name = "HH:MM", requires = "business_start")]
    pub business_end: Option<String>,

    /// IANA time zone for business hours
    #[arg(long, value_name = "TZ", default_value = "UTC")]
    pub timezone: String,

    /// Count weekends as working days
    #[arg(long)]
    pub include_weekends: bool,

    /// Holiday date YYYY-MM-DD (repeatable)
    #[arg(long = "holiday", value_name = "DATE")]
    pub holidays: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ExportCsvArgs {
    #[command(flatten)]
    pub source: JqlArgs,

    /// Saved export profile to use
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,

    #[command(flatten)]
    pub inline: ProfileArgs,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Replace an existing output file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExportJsonArgs {
    #[command(flatten)]
    pub source: JqlArgs,

    /// Directory for the exported files
    #[arg(long, short = 'o', default_value = "jira_export")]
    pub dir: PathBuf,
}

#[derive(Args, Debug, Clone, Default)]
pub struct TimelineArgs {
    #[command(flatten)]
    pub source: JqlArgs,

    /// Project key; used to build the JQL when none is given
    #[arg(long)]
    pub project: Option<String>,

    /// Start from a saved timeline configuration
    #[arg(long, value_name = "NAME", conflicts_with = "last")]
    pub config: Option<String>,

    /// Start from the last used configuration
    #[arg(long)]
    pub last: bool,

    /// Tracked status NAME=ORDER (repeatable)
    #[arg(long = "status", value_name = "NAME=ORDER")]
    pub statuses: Vec<String>,

    /// Status color NAME=#RRGGBB (repeatable)
    #[arg(long = "color", value_name = "NAME=#RRGGBB")]
    pub colors: Vec<String>,

    /// Timeline start (YYYY-MM-DD or timestamp)
    #[arg(long)]
    pub start: Option<String>,

    /// Timeline end (YYYY-MM-DD or timestamp)
    #[arg(long)]
    pub end: Option<String>,

    /// Report file
    #[arg(long, short = 'o', default_value = "timeline_report.html")]
    pub output: PathBuf,

    /// Also save the configuration under this name
    #[arg(long, value_name = "NAME")]
    pub save_config: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SprintArgs {
    #[command(flatten)]
    pub source: JqlArgs,

    /// Agile sprint id; dates and issues come from the sprint
    #[arg(long, value_name = "ID", conflicts_with_all = ["jql", "query", "start", "end"])]
    pub sprint_id: Option<u64>,

    /// Sprint start date
    #[arg(long)]
    pub start: Option<String>,

    /// Sprint end date (a bare date covers the whole day)
    #[arg(long)]
    pub end: Option<String>,

    /// Output CSV file (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RecolorArgs {
    /// Timeline report to recolor
    pub input: PathBuf,

    /// Status color NAME=#RRGGBB (repeatable)
    #[arg(long = "color", value_name = "NAME=#RRGGBB")]
    pub colors: Vec<String>,

    /// Color file exported from a report
    #[arg(long = "colors", value_name = "FILE")]
    pub color_file: Option<PathBuf>,

    /// Write here instead of rewriting the input
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum QueryCommands {
    /// List saved queries
    List,
    /// Show one saved query
    Show { name: String },
    /// Save a new query
    Add {
        name: String,
        jql: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Replace a saved query
    Update {
        name: String,
        jql: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete a saved query
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List export profiles
    List,
    /// Show one export profile
    Show { name: String },
    /// Create or replace an export profile
    Save {
        name: String,
        #[command(flatten)]
        inline: ProfileArgs,
    },
    /// Delete an export profile
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
pub enum TimelineConfigCommands {
    /// List saved timeline configurations
    List,
    /// Show one configuration (use "last" for the auto-saved one)
    Show { name: String },
    /// Delete a saved configuration
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the application directory and files
    Path,
    /// Print the merged configuration (token redacted)
    Show,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: ShellType,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellType {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    #[value(name = "powershell")]
    #[value(alias = "pwsh")]
    /// `PowerShell`
    PowerShell,
    /// Elvish
    Elvish,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_query_conflicts_with_jql() {
        let result = Cli::try_parse_from(["jm", "search", "--jql", "x", "--query", "saved"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "jm",
            "timeline",
            "--status",
            "In Progress=1",
            "--json",
            "--workers",
            "4",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.workers, Some(4));
        let Commands::Timeline(args) = cli.command else {
            panic!("expected timeline");
        };
        assert_eq!(args.statuses, vec!["In Progress=1"]);
        assert_eq!(args.output, PathBuf::from("timeline_report.html"));
    }

    #[test]
    fn test_sprint_id_conflicts_with_dates() {
        assert!(Cli::try_parse_from(["jm", "sprint", "--sprint-id", "7", "--start", "2024-01-01"]).is_err());
        assert!(Cli::try_parse_from(["jm", "sprint", "--sprint-id", "7"]).is_ok());
    }
}

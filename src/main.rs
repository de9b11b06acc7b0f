use clap::Parser;
use jira_metrics::cli::commands::{self, Session};
use jira_metrics::cli::{Cli, Commands};
use jira_metrics::logging::init_logging;
use jira_metrics::output::OutputContext;
use jira_metrics::{JiraMetricsError, Result, StructuredError};
use std::io::{self, IsTerminal};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    if let Err(e) = run(&cli) {
        handle_error(&e, cli.json);
    }
}

fn run(cli: &Cli) -> Result<()> {
    // No configuration needed.
    match &cli.command {
        Commands::Version => return commands::version::execute(&OutputContext::from_args(cli)),
        Commands::Completions(args) => return commands::completions::execute(args),
        _ => {}
    }

    let session = Session::load(cli)?;
    match &cli.command {
        Commands::Login(args) => commands::login::execute(args, &session),
        Commands::Whoami => commands::whoami::execute(&session),
        Commands::Fields(args) => commands::fields::execute(args, &session),
        Commands::Projects => commands::projects::execute(&session),
        Commands::Statuses { project } => commands::statuses::execute(project, &session),
        Commands::Search(args) => commands::search::execute(args, &session),
        Commands::Export { command } => commands::export::execute(command, &session),
        Commands::Timeline(args) => commands::timeline::execute(args, &session),
        Commands::Sprint(args) => commands::sprint::execute(args, &session),
        Commands::Recolor(args) => commands::recolor::execute(args, &session),
        Commands::Query { command } => commands::query::execute(command, &session),
        Commands::Profile { command } => commands::profile::execute(command, &session),
        Commands::TimelineConfig { command } => {
            commands::timeline_config::execute(command, &session)
        }
        Commands::Config { command } => commands::config::execute(command, &session),
        Commands::Version | Commands::Completions(_) => Ok(()),
    }
}

/// Structured JSON on stderr for `--json` or a non-terminal stdout,
/// a human-readable message otherwise.
fn handle_error(err: &JiraMetricsError, json_mode: bool) -> ! {
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    if json_mode || !io::stdout().is_terminal() {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        eprintln!("{}", structured.to_human(io::stderr().is_terminal()));
    }

    std::process::exit(exit_code);
}

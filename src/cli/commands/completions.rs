//! Shell completion scripts for `jm`.
//!
//! ```bash
//! jm completions bash > ~/.local/share/bash-completion/completions/jm
//! jm completions zsh -o ~/.zsh/completions/_jm
//! ```

use crate::cli::{Cli, CompletionsArgs, ShellType};
use crate::error::Result;
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io;
use tracing::info;

const BIN_NAME: &str = "jm";

/// # Errors
///
/// Returns an error if the output file cannot be created.
pub fn execute(args: &CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let shell = to_clap_shell(args.shell);

    match &args.output {
        Some(path) => {
            let mut file = std::fs::File::create(path)?;
            generate(shell, &mut cmd, BIN_NAME, &mut file);
            info!(shell = ?args.shell, path = %path.display(), "Wrote completion script");
            eprintln!("Generated {shell} completions to {}", path.display());
        }
        None => generate(shell, &mut cmd, BIN_NAME, &mut io::stdout()),
    }
    Ok(())
}

const fn to_clap_shell(shell: ShellType) -> Shell {
    match shell {
        ShellType::Bash => Shell::Bash,
        ShellType::Zsh => Shell::Zsh,
        ShellType::Fish => Shell::Fish,
        ShellType::PowerShell => Shell::PowerShell,
        ShellType::Elvish => Shell::Elvish,
    }
}

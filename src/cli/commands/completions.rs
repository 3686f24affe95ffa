//! Completions command - emit a shell completion script

use crate::cli::args::Cli;
use crate::error::FileProcessorResult;
use clap::CommandFactory;
use clap_complete::Shell;

/// Execute the completions command
pub fn execute(shell: Shell) -> FileProcessorResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
    Ok(())
}

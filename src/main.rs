//! fileprocessor - content-addressed derivation cache
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use fileprocessor::cli::{Cli, Commands};
use fileprocessor::config::ConfigManager;
use fileprocessor::error::FileProcessorResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> FileProcessorResult<()> {
    let cli = Cli::parse();

    // Completions don't need config or logging
    if let Commands::Completions { shell } = cli.command {
        return fileprocessor::cli::commands::completions(shell);
    }

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    let mut config = config_manager.load().await?;

    init_logging(cli.verbose, &config.general.log_format);
    debug!("Using config {}", config_manager.path().display());

    if let Some(ref endpoint) = cli.endpoint {
        config.processor.endpoint = endpoint.parse()?;
        debug!("Endpoint overridden: {}", config.processor.endpoint);
    }

    match cli.command {
        Commands::Completions { .. } => unreachable!("Completions handled above"),
        Commands::Serve(args) => fileprocessor::cli::commands::serve(args, &config).await,
        Commands::Output(args) => fileprocessor::cli::commands::output(args, &config).await,
        Commands::Checksum(args) => fileprocessor::cli::commands::checksum(args, &config).await,
        Commands::Render(args) => fileprocessor::cli::commands::render(args, &config).await,
        Commands::Show(args) => fileprocessor::cli::commands::show(args, &config).await,
        Commands::List(args) => fileprocessor::cli::commands::list(args, &config).await,
        Commands::Config(args) => {
            fileprocessor::cli::commands::config(args, &config, &config_manager).await
        }
    }
}

/// Initialize logging: 0 = warn, 1 = info, 2+ = debug. Logs go to stderr.
fn init_logging(verbose: u8, format: &str) {
    let filter = match verbose {
        0 => EnvFilter::new("fileprocessor=warn"),
        1 => EnvFilter::new("fileprocessor=info"),
        _ => EnvFilter::new("fileprocessor=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}

//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// fileprocessor - content-addressed derivation cache
///
/// Turns instructions into processed files and rendered output, keyed by
/// the instructions' checksum so identical requests are never recomputed.
#[derive(Parser, Debug)]
#[command(name = "fileprocessor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "FILEPROCESSOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override processor.endpoint ("LOCAL" or a URL)
    #[arg(long, global = true, env = "FILEPROCESSOR_ENDPOINT")]
    pub endpoint: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve POST /request and GET /<checksum>/ over HTTP
    Serve(ServeArgs),

    /// Print the output for instructions
    Output(InstructionsArgs),

    /// Print the checksum of instructions
    Checksum(InstructionsArgs),

    /// Render a template, resolving fileprocessor blocks
    Render(RenderArgs),

    /// Show a stored record
    Show(ShowArgs),

    /// List stored records
    List(ListArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to listen on (defaults to server.bind)
    #[arg(short, long)]
    pub bind: Option<String>,
}

/// Instructions given inline or on stdin
#[derive(Parser, Debug)]
pub struct InstructionsArgs {
    /// Instruction text, or "-" to read from stdin
    pub instructions: String,
}

/// Arguments for the render command
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Template file
    pub template: PathBuf,

    /// JSON file with template data
    #[arg(short, long)]
    pub data: Option<PathBuf>,
}

/// Arguments for the show command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Record checksum
    pub checksum: String,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for list and show
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

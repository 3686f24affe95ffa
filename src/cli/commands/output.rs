//! Output command - print the rendered output for instructions

use crate::cli::args::InstructionsArgs;
use crate::config::Config;
use crate::error::FileProcessorResult;
use crate::front::ProcessorFront;
use tracing::info;

/// Execute the output command
pub async fn execute(args: InstructionsArgs, config: &Config) -> FileProcessorResult<()> {
    let instructions = super::read_instructions(args.instructions).await?;
    let front = ProcessorFront::from_config(config)?;
    info!("Deriving output ({})", front.mode());

    let output = front.get_output(&instructions).await?;
    println!("{}", output);
    Ok(())
}

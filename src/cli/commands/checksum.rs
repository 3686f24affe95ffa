//! Checksum command - print the record key for instructions

use crate::checksum::checksum;
use crate::cli::args::InstructionsArgs;
use crate::config::Config;
use crate::error::FileProcessorResult;

/// Execute the checksum command
pub async fn execute(args: InstructionsArgs, config: &Config) -> FileProcessorResult<()> {
    let instructions = super::read_instructions(args.instructions).await?;
    let checksum = checksum(&instructions, config.processor.algorithm)?;
    println!("{}", checksum);
    Ok(())
}

//! CLI command implementations

pub mod checksum;
pub mod completions;
pub mod config;
pub mod list;
pub mod output;
pub mod render;
pub mod serve;
pub mod show;

pub use checksum::execute as checksum;
pub use completions::execute as completions;
pub use config::execute as config;
pub use list::execute as list;
pub use output::execute as output;
pub use render::execute as render;
pub use serve::execute as serve;
pub use show::execute as show;

use crate::error::{FileProcessorError, FileProcessorResult};
use tokio::io::AsyncReadExt;

/// Resolve an instructions argument, reading stdin for "-"
///
/// One trailing line ending is dropped from stdin so that
/// `echo X | fileprocessor checksum -` matches `fileprocessor checksum X`.
pub(crate) async fn read_instructions(arg: String) -> FileProcessorResult<String> {
    if arg != "-" {
        return Ok(arg);
    }

    let mut buf = String::new();
    tokio::io::stdin()
        .read_to_string(&mut buf)
        .await
        .map_err(|e| FileProcessorError::io("reading instructions from stdin", e))?;

    Ok(strip_line_ending(buf))
}

fn strip_line_ending(mut s: String) -> String {
    if s.ends_with('\n') {
        s.pop();
        if s.ends_with('\r') {
            s.pop();
        }
    }
    s
}

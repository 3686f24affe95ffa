//! Terminal output helpers shared by the CLI commands
//!
//! Glyph-based output on a terminal, bracketed tags (`[OK]`, `[WARN]`)
//! when piped or running under CI so logs stay greppable.

mod context;
mod output;

pub use context::UiContext;
pub use output::{intro, key_value, key_value_status, step_info, step_ok_detail, step_warn_hint};

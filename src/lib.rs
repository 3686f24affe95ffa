//! fileprocessor - content-addressed derivation cache
//!
//! Turns instructions into a processed file and a rendered output string,
//! keyed by the checksum of the instructions. Identical instructions are
//! derived once, locally or through a remote `/request` endpoint.

pub mod checksum;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod front;
pub mod lock;
pub mod record;
pub mod server;
pub mod store;
pub mod template;
pub mod transform;
pub mod ui;

pub use error::{FileProcessorError, FileProcessorResult};

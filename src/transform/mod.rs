//! Pluggable transformations
//!
//! A transformation turns instruction text into a materialized blob and
//! renders the cacheable output string for the blob's URL. The default
//! [`FetchTransformer`] treats the instructions as a source URL and
//! downloads it.

mod fetch;

pub use fetch::FetchTransformer;

use crate::error::FileProcessorResult;
use async_trait::async_trait;

/// Bytes produced by a transformation, ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    /// Blob contents
    pub bytes: Vec<u8>,
    /// File extension without the leading dot (e.g. "gif")
    pub extension: String,
}

impl Materialized {
    pub fn new(bytes: Vec<u8>, extension: impl Into<String>) -> Self {
        Self {
            bytes,
            extension: extension.into(),
        }
    }
}

/// Transformation contract used by derivation records
///
/// `transform` must either return the complete blob or fail; partial
/// results are never stored.
#[async_trait]
pub trait Transformer: Send + Sync {
    /// Produce the blob for the given instructions
    async fn transform(&self, instructions: &str) -> FileProcessorResult<Materialized>;

    /// Render the output string that embeds the materialized file
    fn render(&self, file_url: &str) -> String {
        format!("<img src=\"{}\" />", file_url)
    }

    /// Human-readable transformation name for logs
    fn name(&self) -> &'static str;
}

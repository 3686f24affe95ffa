//! Error types for fileprocessor
//!
//! All modules use `FileProcessorResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fileprocessor operations
pub type FileProcessorResult<T> = Result<T, FileProcessorError>;

/// All errors that can occur in fileprocessor
#[derive(Error, Debug)]
pub enum FileProcessorError {
    // Input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Checksum mismatch: expected {expected}, computed {computed}")]
    ChecksumMismatch { expected: String, computed: String },

    #[error("Checksum collision: {checksum} is already stored for different instructions")]
    ChecksumCollision { checksum: String },

    #[error("Not found: {0}")]
    NotFound(String),

    // Upstream errors
    #[error("Source unavailable: {url}: {reason}")]
    SourceUnavailable { url: String, reason: String },

    #[error("Remote endpoint unavailable: {endpoint}: {reason}")]
    RemoteUnavailable { endpoint: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Template errors
    #[error("Template error: {0}")]
    Template(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FileProcessorError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    /// Create a source unavailable error
    pub fn source_unavailable(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a remote unavailable error
    pub fn remote_unavailable(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RemoteUnavailable {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::ChecksumMismatch { .. } | Self::NotFound(_)
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::RemoteUnavailable { .. } => {
                Some("Check processor.endpoint, or set it to \"LOCAL\" to process in-process")
            }
            Self::SourceUnavailable { .. } => Some("The source may be down; retry later"),
            Self::ConfigInvalid { .. } => Some("Run: fileprocessor config show"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FileProcessorError::ChecksumMismatch {
            expected: "abc".to_string(),
            computed: "def".to_string(),
        };
        assert!(err.to_string().contains("expected abc"));
    }

    #[test]
    fn error_hint() {
        let err = FileProcessorError::remote_unavailable("http://x", "refused");
        assert!(err.hint().unwrap().contains("LOCAL"));
        assert_eq!(FileProcessorError::NotFound("x".into()).hint(), None);
    }

    #[test]
    fn error_client_classification() {
        assert!(FileProcessorError::NotFound("x".into()).is_client_error());
        assert!(!FileProcessorError::Internal("x".into()).is_client_error());
    }
}

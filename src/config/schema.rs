//! Configuration schema for fileprocessor
//!
//! Configuration is stored at `~/.config/fileprocessor/config.toml`

use crate::checksum::Algorithm;
use crate::config::ConfigManager;
use crate::error::FileProcessorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

/// Sentinel endpoint value selecting in-process derivation
pub const LOCAL_ENDPOINT: &str = "LOCAL";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Processor front settings
    pub processor: ProcessorConfig,

    /// Record and blob storage
    pub storage: StorageConfig,

    /// Source fetching
    pub fetch: FetchConfig,

    /// HTTP server
    pub server: ServerConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Where derivations run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Endpoint {
    /// Derive in-process
    #[default]
    Local,
    /// Forward instructions to a remote `/request` endpoint
    Remote(Url),
}

impl FromStr for Endpoint {
    type Err = FileProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(LOCAL_ENDPOINT) {
            return Ok(Self::Local);
        }

        let url = Url::parse(s).map_err(|e| {
            FileProcessorError::invalid_input(format!(
                "endpoint '{}' is neither \"{}\" nor a URL: {}",
                s, LOCAL_ENDPOINT, e
            ))
        })?;

        match url.scheme() {
            "http" | "https" => Ok(Self::Remote(url)),
            other => Err(FileProcessorError::invalid_input(format!(
                "endpoint scheme '{}' is not supported",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Endpoint {
    type Error = FileProcessorError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Endpoint> for String {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.to_string()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str(LOCAL_ENDPOINT),
            Self::Remote(url) => f.write_str(url.as_str()),
        }
    }
}

/// Processor front configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// "LOCAL" or the URL of a remote `/request` endpoint
    pub endpoint: Endpoint,

    /// Checksum algorithm for record keys
    pub algorithm: Algorithm,

    /// Timeout for remote dispatch in seconds
    pub remote_timeout_secs: u64,

    /// Deadline for one local derivation in seconds (0 = none)
    pub deadline_secs: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::Local,
            algorithm: Algorithm::Sha1,
            remote_timeout_secs: 30,
            deadline_secs: 0,
        }
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Fs,
    Memory,
}

/// Record and blob storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage backend: "fs" or "memory"
    pub backend: StorageBackend,

    /// Directory holding one JSON document per record
    pub records_dir: PathBuf,

    /// Directory holding materialized files
    pub blobs_dir: PathBuf,

    /// URL prefix materialized files are served under
    pub blob_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Fs,
            records_dir: ConfigManager::state_dir().join("records"),
            blobs_dir: ConfigManager::state_dir().join("processed_file"),
            blob_base_url: "/media/processed_file".to_string(),
        }
    }
}

/// Source fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum accepted body size in bytes
    pub max_bytes: u64,

    /// User-Agent header sent with fetches
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_bytes: 10 * 1024 * 1024,
            user_agent: format!("fileprocessor/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind: String,

    /// Serve `blob_base_url` from the blob store
    pub serve_blobs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            serve_blobs: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[processor]"));
        assert!(toml.contains("endpoint = \"LOCAL\""));
        assert!(toml.contains("algorithm = \"sha1\""));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.processor.endpoint, Endpoint::Local);
        assert_eq!(config.storage.backend, StorageBackend::Fs);
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [processor]
            endpoint = "http://files.example.org/request"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(config.processor.endpoint, Endpoint::Remote(_)));
        assert_eq!(config.fetch.timeout_secs, 30); // default preserved
    }

    #[test]
    fn endpoint_sentinel_is_case_insensitive() {
        assert_eq!("local".parse::<Endpoint>().unwrap(), Endpoint::Local);
        assert_eq!(" LOCAL ".parse::<Endpoint>().unwrap(), Endpoint::Local);
    }

    #[test]
    fn endpoint_rejects_non_http() {
        assert!("ftp://example.org/request".parse::<Endpoint>().is_err());
        assert!("somewhere".parse::<Endpoint>().is_err());
    }

    #[test]
    fn invalid_endpoint_fails_deserialization() {
        let toml = r#"
            [processor]
            endpoint = "not a url"
        "#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn endpoint_display_roundtrip() {
        let endpoint: Endpoint = "http://files.example.org/request".parse().unwrap();
        assert_eq!(endpoint.to_string(), "http://files.example.org/request");
    }
}

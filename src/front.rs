//! Processor front: the single entry point for rendering integrations
//!
//! Picks local or remote derivation once, at construction, from the
//! configured endpoint.

use crate::checksum::{checksum, Algorithm};
use crate::config::{Config, Endpoint};
use crate::dispatch::{LocalExecutor, RemoteDispatcher};
use crate::error::FileProcessorResult;
use std::time::Duration;
use tracing::debug;

/// Local or remote output provider
#[derive(Clone)]
pub enum ProcessorFront {
    /// Derive in-process
    Local(LocalExecutor),
    /// Forward to a remote endpoint with the locally computed checksum
    Remote {
        dispatcher: RemoteDispatcher,
        algorithm: Algorithm,
    },
}

impl ProcessorFront {
    /// Build the front selected by `processor.endpoint`
    pub fn from_config(config: &Config) -> FileProcessorResult<Self> {
        match &config.processor.endpoint {
            Endpoint::Local => Ok(Self::Local(LocalExecutor::from_config(config)?)),
            Endpoint::Remote(url) => Ok(Self::Remote {
                dispatcher: RemoteDispatcher::new(
                    url.clone(),
                    Duration::from_secs(config.processor.remote_timeout_secs),
                ),
                algorithm: config.processor.algorithm,
            }),
        }
    }

    /// Human-readable mode for logs and CLI output
    pub fn mode(&self) -> String {
        match self {
            Self::Local(_) => "local".to_string(),
            Self::Remote { dispatcher, .. } => format!("remote ({})", dispatcher.endpoint()),
        }
    }

    /// Output string for `instructions`
    pub async fn get_output(&self, instructions: &str) -> FileProcessorResult<String> {
        match self {
            Self::Local(executor) => executor.get_output(instructions).await,
            Self::Remote {
                dispatcher,
                algorithm,
            } => {
                let checksum = checksum(instructions, *algorithm)?;
                debug!("Forwarding {} to remote endpoint", checksum);
                dispatcher.dispatch(instructions, Some(&checksum)).await
            }
        }
    }
}

//! Storage for derivation records and materialized blobs
//!
//! Records live in a key-value store keyed by checksum (upsert on put).
//! Materialized files live in a blob store that hands back URLs.
//!
//! | Backend | Records | Blobs |
//! |---------|---------|-------|
//! | `fs` | one JSON file per checksum | files under `blobs_dir` |
//! | `memory` | `HashMap` | `HashMap` |

mod fs;
mod memory;

pub use self::fs::{FsBlobStore, FsRecordStore};
pub use memory::{MemoryBlobStore, MemoryRecordStore};

use crate::checksum::Checksum;
use crate::config::schema::{StorageBackend, StorageConfig};
use crate::error::{FileProcessorError, FileProcessorResult};
use crate::record::DerivationRecord;
use async_trait::async_trait;
use std::sync::Arc;

/// Key-value store of derivation records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Look up a record by checksum
    async fn get(&self, checksum: &Checksum) -> FileProcessorResult<Option<DerivationRecord>>;

    /// Insert or overwrite the record stored under its checksum
    async fn put(&self, record: &DerivationRecord) -> FileProcessorResult<()>;

    /// All stored records, ordered by checksum
    async fn list(&self) -> FileProcessorResult<Vec<DerivationRecord>>;
}

/// Blob store for materialized files
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a complete blob under `name` and return its URL
    async fn store(&self, name: &str, bytes: &[u8]) -> FileProcessorResult<String>;

    /// URL of a stored blob
    fn url_for(&self, name: &str) -> String;

    /// Read a blob back, if present
    async fn read(&self, name: &str) -> FileProcessorResult<Option<Vec<u8>>>;
}

/// Reject blob names that could escape the store
pub(crate) fn validate_blob_name(name: &str) -> FileProcessorResult<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(FileProcessorError::invalid_input(format!(
            "invalid blob name '{}'",
            name
        )))
    }
}

/// Join a base URL and a blob name with exactly one slash
pub(crate) fn join_url(base: &str, name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), name)
}

/// Create the record and blob stores selected by config
pub fn create_stores(
    config: &StorageConfig,
) -> FileProcessorResult<(Arc<dyn RecordStore>, Arc<dyn BlobStore>)> {
    match config.backend {
        StorageBackend::Fs => Ok((
            Arc::new(FsRecordStore::new(config.records_dir.clone())),
            Arc::new(FsBlobStore::new(
                config.blobs_dir.clone(),
                config.blob_base_url.clone(),
            )),
        )),
        StorageBackend::Memory => Ok((
            Arc::new(MemoryRecordStore::new()),
            Arc::new(MemoryBlobStore::new(config.blob_base_url.clone())),
        )),
    }
}

//! In-memory record and blob stores

use crate::checksum::Checksum;
use crate::error::FileProcessorResult;
use crate::record::DerivationRecord;
use crate::store::{join_url, validate_blob_name, BlobStore, RecordStore};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// Records held in a map keyed by checksum
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<BTreeMap<Checksum, DerivationRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, checksum: &Checksum) -> FileProcessorResult<Option<DerivationRecord>> {
        Ok(self.records.read().await.get(checksum).cloned().map(|mut record| {
            record.stored = true;
            record
        }))
    }

    async fn put(&self, record: &DerivationRecord) -> FileProcessorResult<()> {
        self.records
            .write()
            .await
            .insert(record.checksum().clone(), record.clone());
        Ok(())
    }

    async fn list(&self) -> FileProcessorResult<Vec<DerivationRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .cloned()
            .map(|mut record| {
                record.stored = true;
                record
            })
            .collect())
    }
}

/// Blobs held in a map, with URLs under `base_url`
pub struct MemoryBlobStore {
    base_url: String,
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            blobs: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(&self, name: &str, bytes: &[u8]) -> FileProcessorResult<String> {
        validate_blob_name(name)?;
        self.blobs
            .write()
            .await
            .insert(name.to_string(), bytes.to_vec());
        Ok(self.url_for(name))
    }

    fn url_for(&self, name: &str) -> String {
        join_url(&self.base_url, name)
    }

    async fn read(&self, name: &str) -> FileProcessorResult<Option<Vec<u8>>> {
        Ok(self.blobs.read().await.get(name).cloned())
    }
}

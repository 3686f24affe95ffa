//! Filesystem-backed record and blob stores
//!
//! Writes go to a temp file in the target directory and are renamed into
//! place, so readers see either the old document or the complete new one.

use crate::checksum::Checksum;
use crate::error::{FileProcessorError, FileProcessorResult};
use crate::record::DerivationRecord;
use crate::store::{join_url, validate_blob_name, BlobStore, RecordStore};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// Write `contents` to `path` via a temp file + rename
async fn write_atomic(path: &Path, contents: &[u8]) -> FileProcessorResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| FileProcessorError::Internal(format!("{} has no parent", path.display())))?;

    fs::create_dir_all(parent)
        .await
        .map_err(|e| FileProcessorError::io(format!("creating directory {}", parent.display()), e))?;

    let tmp = parent.join(format!(".tmp-{}", Uuid::new_v4()));
    if let Err(e) = fs::write(&tmp, contents).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(FileProcessorError::io(format!("writing {}", tmp.display()), e));
    }

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(FileProcessorError::io(
            format!("moving {} into place", path.display()),
            e,
        ));
    }

    Ok(())
}

/// Derivation records as `<records_dir>/<checksum>.json`
pub struct FsRecordStore {
    records_dir: PathBuf,
}

impl FsRecordStore {
    pub fn new(records_dir: PathBuf) -> Self {
        Self { records_dir }
    }

    fn record_path(&self, checksum: &Checksum) -> PathBuf {
        self.records_dir.join(format!("{}.json", checksum))
    }
}

#[async_trait]
impl RecordStore for FsRecordStore {
    async fn get(&self, checksum: &Checksum) -> FileProcessorResult<Option<DerivationRecord>> {
        let path = self.record_path(checksum);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(FileProcessorError::io(
                    format!("reading record {}", path.display()),
                    e,
                ))
            }
        };

        let record: DerivationRecord = serde_json::from_str(&content)?;
        if record.checksum() != checksum {
            return Err(FileProcessorError::Internal(format!(
                "record file {} holds checksum {}",
                path.display(),
                record.checksum()
            )));
        }

        Ok(Some(record))
    }

    async fn put(&self, record: &DerivationRecord) -> FileProcessorResult<()> {
        let path = self.record_path(record.checksum());
        let content = serde_json::to_string_pretty(record)?;
        write_atomic(&path, content.as_bytes()).await?;

        debug!("Stored record {}", path.display());
        Ok(())
    }

    async fn list(&self) -> FileProcessorResult<Vec<DerivationRecord>> {
        let mut entries = match fs::read_dir(&self.records_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(FileProcessorError::io("reading records directory", e)),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FileProcessorError::io("reading records entry", e))?
        {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }

            let content = fs::read_to_string(&path)
                .await
                .map_err(|e| FileProcessorError::io(format!("reading record {}", path.display()), e))?;

            match serde_json::from_str::<DerivationRecord>(&content) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable record {}: {}", path.display(), e),
            }
        }

        records.sort_by(|a, b| a.checksum().cmp(b.checksum()));
        Ok(records)
    }
}

/// Materialized files under `blobs_dir`, served from `base_url`
pub struct FsBlobStore {
    blobs_dir: PathBuf,
    base_url: String,
}

impl FsBlobStore {
    pub fn new(blobs_dir: PathBuf, base_url: String) -> Self {
        Self {
            blobs_dir,
            base_url,
        }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn store(&self, name: &str, bytes: &[u8]) -> FileProcessorResult<String> {
        validate_blob_name(name)?;
        let path = self.blobs_dir.join(name);
        write_atomic(&path, bytes).await?;

        debug!("Stored blob {} ({} bytes)", path.display(), bytes.len());
        Ok(self.url_for(name))
    }

    fn url_for(&self, name: &str) -> String {
        join_url(&self.base_url, name)
    }

    async fn read(&self, name: &str) -> FileProcessorResult<Option<Vec<u8>>> {
        validate_blob_name(name)?;
        let path = self.blobs_dir.join(name);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FileProcessorError::io(
                format!("reading blob {}", path.display()),
                e,
            )),
        }
    }
}

//! Store-backed record transitions: save, process, preprocess
//!
//! Every transition is linear: ensure the state, then read it back once.
//! A transition that fails leaves the in-memory and stored record as it
//! was, so the next call retries from the same point.

use crate::error::{FileProcessorError, FileProcessorResult};
use crate::record::DerivationRecord;
use crate::store::{BlobStore, RecordStore};
use crate::transform::Transformer;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// Collaborators a record needs to move through its lifecycle
#[derive(Clone)]
pub struct Backends {
    pub records: Arc<dyn RecordStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub transformer: Arc<dyn Transformer>,
}

impl Backends {
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        transformer: Arc<dyn Transformer>,
    ) -> Self {
        Self {
            records,
            blobs,
            transformer,
        }
    }
}

impl DerivationRecord {
    /// Persist the record under its checksum (upsert)
    pub async fn save(&mut self, backends: &Backends) -> FileProcessorResult<()> {
        backends.records.put(self).await?;
        self.stored = true;
        debug!("Saved record {} ({})", self.checksum(), self.state());
        Ok(())
    }

    /// Run the transformation and link the stored blob.
    ///
    /// The blob is fully written before the record references it.
    pub async fn process(&mut self, backends: &Backends) -> FileProcessorResult<()> {
        if self.is_processed() {
            return Err(FileProcessorError::Internal(format!(
                "record {} is already processed",
                self.checksum()
            )));
        }

        info!(
            "Processing {} with {} transformer",
            self.checksum(),
            backends.transformer.name()
        );
        let materialized = backends.transformer.transform(self.instructions()).await?;

        let name = format!("{}.{}", self.checksum(), materialized.extension);
        backends.blobs.store(&name, &materialized.bytes).await?;

        self.materialized_file = Some(name);
        self.processed_at = Some(Utc::now());

        if !self.is_processed() {
            return Err(FileProcessorError::Internal(format!(
                "processing {} did not produce a file",
                self.checksum()
            )));
        }

        debug!(
            "Materialized {} ({} bytes)",
            self.checksum(),
            materialized.bytes.len()
        );
        Ok(())
    }

    /// Render the cacheable output and persist the record
    pub async fn preprocess(&mut self, backends: &Backends) -> FileProcessorResult<()> {
        if self.is_preprocessed() {
            return Err(FileProcessorError::Internal(format!(
                "record {} is already preprocessed",
                self.checksum()
            )));
        }

        let file_url = self.get_file_url(backends).await?;
        let output = backends.transformer.render(&file_url);

        let previous = self.output.replace(output);
        if let Err(e) = self.save(backends).await {
            self.output = previous;
            return Err(e);
        }

        debug!("Preprocessed {}", self.checksum());
        Ok(())
    }

    /// Output string, rendering it on first access
    pub async fn get_output(&mut self, backends: &Backends) -> FileProcessorResult<String> {
        if !self.is_preprocessed() {
            self.preprocess(backends).await?;
        }

        self.output.clone().ok_or_else(|| {
            FileProcessorError::Internal(format!(
                "record {} has no output after preprocessing",
                self.checksum()
            ))
        })
    }

    /// URL of the materialized file, processing on first access
    ///
    /// A freshly processed record is saved so the file is linked in the
    /// store before the URL is handed out.
    pub async fn get_file_url(&mut self, backends: &Backends) -> FileProcessorResult<String> {
        if !self.is_processed() {
            let snapshot = (self.materialized_file.clone(), self.processed_at);
            self.process(backends).await?;
            if let Err(e) = self.save(backends).await {
                (self.materialized_file, self.processed_at) = snapshot;
                return Err(e);
            }
        }

        let name = self.materialized_file.as_deref().ok_or_else(|| {
            FileProcessorError::Internal(format!(
                "record {} has no file after processing",
                self.checksum()
            ))
        })?;

        Ok(backends.blobs.url_for(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::Algorithm;
    use crate::record::{Derivation, RecordState};
    use crate::store::{MemoryBlobStore, MemoryRecordStore};
    use crate::transform::testing::CountingTransformer;

    fn backends(transformer: CountingTransformer) -> Backends {
        Backends::new(
            Arc::new(MemoryRecordStore::new()),
            Arc::new(MemoryBlobStore::new("/media/processed_file")),
            Arc::new(transformer),
        )
    }

    fn record(instructions: &str) -> DerivationRecord {
        DerivationRecord::new(Derivation::new(instructions, Algorithm::Sha1).unwrap())
    }

    #[tokio::test]
    async fn hart_gif_end_to_end() {
        let backends = backends(CountingTransformer::new());
        let mut record = record("http://example.org/hart.gif");
        assert_eq!(
            record.checksum().as_str(),
            "5cb45cbf5f95ba14c9702b394471668396583853"
        );

        record.save(&backends).await.unwrap();
        let url = record.get_file_url(&backends).await.unwrap();
        assert!(url.ends_with("5cb45cbf5f95ba14c9702b394471668396583853.gif"));

        let output = record.get_output(&backends).await.unwrap();
        assert_eq!(output, format!("<img src=\"{}\" />", url));
    }

    #[tokio::test]
    async fn get_output_is_idempotent() {
        let transformer = CountingTransformer::new();
        let backends = backends(transformer.clone());
        let mut record = record("http://example.org/hart.gif");

        let first = record.get_output(&backends).await.unwrap();
        let second = record.get_output(&backends).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(transformer.count(), 1);
        assert_eq!(record.state(), RecordState::Preprocessed);
    }

    #[tokio::test]
    async fn save_then_load_round_trip() {
        let backends = backends(CountingTransformer::new());
        let mut record = record("http://example.org/hart.gif");
        record.get_output(&backends).await.unwrap();

        let loaded = backends.records.get(record.checksum()).await.unwrap().unwrap();
        assert_eq!(loaded, record);
        assert_eq!(loaded.output(), record.output());
        assert_eq!(loaded.materialized_file(), record.materialized_file());
    }

    #[tokio::test]
    async fn failed_fetch_leaves_record_unprocessed() {
        let transformer = CountingTransformer::failing_first(1);
        let backends = backends(transformer.clone());
        let mut record = record("http://example.org/hart.gif");
        record.save(&backends).await.unwrap();

        let err = record.process(&backends).await.unwrap_err();
        assert!(matches!(err, FileProcessorError::SourceUnavailable { .. }));
        assert!(!record.is_processed());

        let stored = backends.records.get(record.checksum()).await.unwrap().unwrap();
        assert!(!stored.is_processed());

        // A later call retries the fetch instead of returning a cached failure
        let output = record.get_output(&backends).await.unwrap();
        assert!(output.contains(".gif"));
        assert_eq!(transformer.count(), 2);
    }

    #[tokio::test]
    async fn process_twice_is_an_error() {
        let backends = backends(CountingTransformer::new());
        let mut record = record("http://example.org/hart.gif");

        record.process(&backends).await.unwrap();
        assert!(record.process(&backends).await.is_err());
    }

    #[tokio::test]
    async fn preprocess_twice_is_an_error() {
        let backends = backends(CountingTransformer::new());
        let mut record = record("http://example.org/hart.gif");

        record.preprocess(&backends).await.unwrap();
        assert!(record.preprocess(&backends).await.is_err());
    }

    #[tokio::test]
    async fn save_upserts_by_checksum() {
        let backends = backends(CountingTransformer::new());
        let mut a = record("X");
        let mut b = record("X");

        a.save(&backends).await.unwrap();
        b.save(&backends).await.unwrap();

        assert_eq!(backends.records.list().await.unwrap().len(), 1);
        assert_eq!(a.state(), RecordState::Stored);
    }
}

//! In-process derivation with per-checksum exclusion

use crate::checksum::{Algorithm, Checksum};
use crate::config::Config;
use crate::error::{FileProcessorError, FileProcessorResult};
use crate::lock::{KeyedGuard, KeyedLocks};
use crate::record::{Backends, Derivation, DerivationRecord};
use crate::store::create_stores;
use crate::transform::FetchTransformer;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Runs checksum + derivation in-process
///
/// Cloning shares the stores and the lock table.
#[derive(Clone)]
pub struct LocalExecutor {
    backends: Backends,
    algorithm: Algorithm,
    locks: Arc<KeyedLocks>,
    deadline: Option<Duration>,
}

impl LocalExecutor {
    pub fn new(backends: Backends, algorithm: Algorithm) -> Self {
        Self {
            backends,
            algorithm,
            locks: Arc::new(KeyedLocks::new()),
            deadline: None,
        }
    }

    /// Build the stores and fetch transformer selected by config
    ///
    /// A non-zero `processor.deadline_secs` also caps the fetch timeout, so
    /// an abandoned fetch ends with its caller's deadline.
    pub fn from_config(config: &Config) -> FileProcessorResult<Self> {
        let deadline = match config.processor.deadline_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let (records, blobs) = create_stores(&config.storage)?;
        let transformer = Arc::new(FetchTransformer::with_deadline(&config.fetch, deadline));
        let executor = Self::new(
            Backends::new(records, blobs, transformer),
            config.processor.algorithm,
        );

        Ok(match deadline {
            Some(deadline) => executor.with_deadline(deadline),
            None => executor,
        })
    }

    /// Stop waiting for a derivation that runs longer than `deadline`
    ///
    /// The derivation itself keeps its checksum locked until it returns, so
    /// a retry waits for it instead of fetching the source a second time.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    /// Checksum of `instructions` under the configured algorithm
    pub fn checksum(&self, instructions: &str) -> FileProcessorResult<Checksum> {
        crate::checksum::checksum(instructions, self.algorithm)
    }

    /// Output for `instructions`, deriving it on first request
    pub async fn get_output(&self, instructions: &str) -> FileProcessorResult<String> {
        let derivation = Derivation::new(instructions, self.algorithm)?;
        let guard = self.locks.lock(derivation.checksum()).await;
        let source = derivation.instructions().to_string();

        self.run_locked(guard, source, move |this| async move {
            let mut record = this.load_or_create(derivation).await?;
            record.get_output(&this.backends).await
        })
        .await
    }

    /// Output of an already stored record, or `None` if the checksum is unknown
    pub async fn cached_output(&self, checksum: &Checksum) -> FileProcessorResult<Option<String>> {
        let guard = self.locks.lock(checksum).await;

        let Some(mut record) = self.backends.records.get(checksum).await? else {
            return Ok(None);
        };
        let source = record.instructions().to_string();

        let output = self
            .run_locked(guard, source, move |this| async move {
                record.get_output(&this.backends).await
            })
            .await?;
        Ok(Some(output))
    }

    /// URL of a stored record's file, processing it on first request
    pub async fn get_file_url(&self, checksum: &Checksum) -> FileProcessorResult<String> {
        let guard = self.locks.lock(checksum).await;

        let mut record = self
            .backends
            .records
            .get(checksum)
            .await?
            .ok_or_else(|| FileProcessorError::NotFound(format!("no record for {}", checksum)))?;
        let source = record.instructions().to_string();

        self.run_locked(guard, source, move |this| async move {
            record.get_file_url(&this.backends).await
        })
        .await
    }

    /// Stored record for `checksum`
    pub async fn record(&self, checksum: &Checksum) -> FileProcessorResult<Option<DerivationRecord>> {
        self.backends.records.get(checksum).await
    }

    /// Reuse the cached record for this checksum or create and save a new one
    async fn load_or_create(&self, derivation: Derivation) -> FileProcessorResult<DerivationRecord> {
        if let Some(existing) = self.backends.records.get(derivation.checksum()).await? {
            if existing.instructions() != derivation.instructions() {
                return Err(FileProcessorError::ChecksumCollision {
                    checksum: derivation.checksum().to_string(),
                });
            }
            debug!("Cache hit for {} ({})", existing.checksum(), existing.state());
            return Ok(existing);
        }

        info!("Creating record {}", derivation.checksum());
        let mut record = DerivationRecord::new(derivation);
        record.save(&self.backends).await?;
        Ok(record)
    }

    /// Run `work` on its own task, which owns `guard` until the work returns
    ///
    /// The caller stops waiting at the deadline or when its own future is
    /// dropped; neither releases the checksum while a fetch is in flight.
    async fn run_locked<T, F, Fut>(
        &self,
        guard: KeyedGuard,
        source: String,
        work: F,
    ) -> FileProcessorResult<T>
    where
        F: FnOnce(LocalExecutor) -> Fut,
        Fut: Future<Output = FileProcessorResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let work = work(self.clone());
        let task = tokio::spawn(async move {
            let result = work.await;
            drop(guard);
            result
        });
        debug!("{} derivation(s) in flight", self.locks.len());

        let joined = match self.deadline {
            None => task.await,
            Some(deadline) => match tokio::time::timeout(deadline, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!("Derivation of {} exceeded {:?} deadline", source, deadline);
                    return Err(FileProcessorError::source_unavailable(
                        source,
                        format!("derivation exceeded {}s deadline", deadline.as_secs_f32()),
                    ));
                }
            },
        };

        joined.map_err(|e| FileProcessorError::Internal(format!("derivation task failed: {}", e)))?
    }
}

//! Derivation value type and the persisted record that embeds it

use crate::checksum::{checksum, Algorithm, Checksum};
use crate::error::FileProcessorResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Instructions together with their memoized checksum
///
/// Fields are private: the checksum is computed once at construction and
/// can never drift from the instructions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Derivation {
    checksum: Checksum,
    instructions: String,
}

impl Derivation {
    /// Compute the checksum for `instructions`
    pub fn new(instructions: impl Into<String>, algorithm: Algorithm) -> FileProcessorResult<Self> {
        let instructions = instructions.into();
        let checksum = checksum(&instructions, algorithm)?;
        debug!("Derivation {} from {} bytes of instructions", checksum, instructions.len());

        Ok(Self {
            checksum,
            instructions,
        })
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }
}

/// Lifecycle state of a record, derived from its populated fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    New,
    Stored,
    Processed,
    Preprocessed,
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Stored => write!(f, "stored"),
            Self::Processed => write!(f, "processed"),
            Self::Preprocessed => write!(f, "preprocessed"),
        }
    }
}

/// Cache entry mapping a checksum to its derived output and file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivationRecord {
    #[serde(flatten)]
    derivation: Derivation,

    /// Rendered output string, present once preprocessed
    pub(crate) output: Option<String>,

    /// Blob name of the materialized file, present once processed
    pub(crate) materialized_file: Option<String>,

    /// When the record was first created
    pub created_at: DateTime<Utc>,

    /// When the file was materialized
    pub(crate) processed_at: Option<DateTime<Utc>>,

    /// Set once the record has been written to or read from a store
    #[serde(skip_serializing, default = "loaded_from_store")]
    pub(crate) stored: bool,
}

fn loaded_from_store() -> bool {
    true
}

impl PartialEq for DerivationRecord {
    fn eq(&self, other: &Self) -> bool {
        self.derivation == other.derivation
            && self.output == other.output
            && self.materialized_file == other.materialized_file
            && self.created_at == other.created_at
            && self.processed_at == other.processed_at
    }
}

impl DerivationRecord {
    /// Create an empty, unsaved record
    pub fn new(derivation: Derivation) -> Self {
        Self {
            derivation,
            output: None,
            materialized_file: None,
            created_at: Utc::now(),
            processed_at: None,
            stored: false,
        }
    }

    pub fn checksum(&self) -> &Checksum {
        self.derivation.checksum()
    }

    pub fn instructions(&self) -> &str {
        self.derivation.instructions()
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn materialized_file(&self) -> Option<&str> {
        self.materialized_file.as_deref()
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    /// Has the file been materialized?
    pub fn is_processed(&self) -> bool {
        self.materialized_file.is_some()
    }

    /// Has the output been rendered?
    pub fn is_preprocessed(&self) -> bool {
        self.output.is_some()
    }

    /// Current lifecycle state
    ///
    /// Records loaded from a store count as stored.
    pub fn state(&self) -> RecordState {
        if self.is_preprocessed() {
            RecordState::Preprocessed
        } else if self.is_processed() {
            RecordState::Processed
        } else if self.stored {
            RecordState::Stored
        } else {
            RecordState::New
        }
    }

    #[cfg(test)]
    pub(crate) fn set_output_for_test(&mut self, output: &str) {
        self.output = Some(output.to_string());
    }
}

//! Derivation records: the unit of caching
//!
//! A [`Derivation`] is the pure value (instructions + memoized checksum).
//! A [`DerivationRecord`] embeds it and adds the lazily populated output
//! and materialized file, plus the store-backed lifecycle operations.
//!
//! # Record States
//!
//! | State | output | materialized_file | Description |
//! |-------|--------|-------------------|-------------|
//! | New | - | - | Created in memory, not yet saved |
//! | Stored | - | - | Saved, nothing derived yet |
//! | Processed | - | set | File materialized, output not rendered |
//! | Preprocessed | set | any | Output rendered, served from cache |
//!
//! Preprocessing needs the file URL, so in practice preprocessing drives
//! processing.

mod derivation;
mod lifecycle;

pub use derivation::{Derivation, DerivationRecord, RecordState};
pub use lifecycle::Backends;

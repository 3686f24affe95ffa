//! Instruction checksums for content-addressed caching
//!
//! The checksum of an instruction's raw bytes is the cache key of its
//! derivation record. Same instructions = same checksum = same record.

use crate::error::{FileProcessorError, FileProcessorResult};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Digest algorithm used to key derivation records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// SHA-1, 40 hex chars
    #[default]
    Sha1,
    /// SHA-256, 64 hex chars
    Sha256,
}

impl Algorithm {
    /// Length of the hex encoded digest
    pub fn hex_len(&self) -> usize {
        match self {
            Self::Sha1 => 40,
            Self::Sha256 => 64,
        }
    }

    fn hex_digest(&self, bytes: &[u8]) -> String {
        match self {
            Self::Sha1 => hex::encode(Sha1::digest(bytes)),
            Self::Sha256 => hex::encode(Sha256::digest(bytes)),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "sha1"),
            Self::Sha256 => write!(f, "sha256"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = FileProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            other => Err(FileProcessorError::invalid_input(format!(
                "unknown checksum algorithm '{}'. Valid: sha1, sha256",
                other
            ))),
        }
    }
}

/// Lowercase hex digest of an instruction
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    /// Parse a caller-supplied checksum.
    ///
    /// Accepts 40 (sha1) or 64 (sha256) hex chars in either case and
    /// normalizes to lowercase.
    pub fn parse(s: &str) -> FileProcessorResult<Self> {
        let s = s.trim();
        let valid_len = s.len() == Algorithm::Sha1.hex_len() || s.len() == Algorithm::Sha256.hex_len();
        if !valid_len || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(FileProcessorError::invalid_input(format!(
                "'{}' is not a valid checksum",
                s
            )));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Checksum {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compute the checksum of an instruction's raw bytes.
///
/// Empty instructions are a caller error and are rejected with
/// `InvalidInput`.
pub fn checksum(instructions: impl AsRef<[u8]>, algorithm: Algorithm) -> FileProcessorResult<Checksum> {
    let bytes = instructions.as_ref();
    if bytes.is_empty() {
        return Err(FileProcessorError::invalid_input(
            "no instructions to calculate checksum for",
        ));
    }
    Ok(Checksum(algorithm.hex_digest(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_known_digest() {
        let sum = checksum("my instructions", Algorithm::Sha1).unwrap();
        assert_eq!(sum.as_str(), "b29f9e2949f7877561a7dd380543afc2e941516c");
    }

    #[test]
    fn sha256_known_digest() {
        let sum = checksum("X", Algorithm::Sha256).unwrap();
        assert_eq!(
            sum.as_str(),
            "4b68ab3847feda7d6c62c1fbcbeebfa35eab7351ed5e78f4ddadea5df64b8015"
        );
    }

    #[test]
    fn checksum_deterministic() {
        let a = checksum("http://example.org/hart.gif", Algorithm::Sha1).unwrap();
        let b = checksum("http://example.org/hart.gif", Algorithm::Sha1).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 40);
    }

    #[test]
    fn checksum_different_content() {
        let a = checksum("content 1", Algorithm::Sha1).unwrap();
        let b = checksum("content 2", Algorithm::Sha1).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn empty_instructions_rejected() {
        let err = checksum("", Algorithm::Sha1).unwrap_err();
        assert!(matches!(err, FileProcessorError::InvalidInput(_)));
    }

    #[test]
    fn parse_normalizes_case() {
        let sum = Checksum::parse("B29F9E2949F7877561A7DD380543AFC2E941516C").unwrap();
        assert_eq!(sum.as_str(), "b29f9e2949f7877561a7dd380543afc2e941516c");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Checksum::parse("not-a-checksum").is_err());
        assert!(Checksum::parse("../../../etc/passwd").is_err());
        assert!(Checksum::parse(&"z".repeat(40)).is_err());
    }

    #[test]
    fn algorithm_from_str() {
        assert_eq!("SHA256".parse::<Algorithm>().unwrap(), Algorithm::Sha256);
        assert!("md5".parse::<Algorithm>().is_err());
    }
}

//! Content synchronization digests
//!
//! A digest is a truncated SHA-256 over the raw bytes of a content file. It
//! detects drift between the registry and the file on disk; it is not an
//! integrity or security mechanism.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// Number of hex characters kept from the full SHA-256
pub const DIGEST_LEN: usize = 16;

/// Truncated content digest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Compute digest from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        let mut hex = format!("{:x}", hash);
        hex.truncate(DIGEST_LEN);
        Self(hex)
    }

    /// Compute digest of a file on disk
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::from_bytes(&bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a stored digest string. Case-insensitive on the hex.
    pub fn matches(&self, stored: &str) -> bool {
        self.0.eq_ignore_ascii_case(stored.trim())
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ContentDigest> for String {
    fn from(d: ContentDigest) -> Self {
        d.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_consistency() {
        let a = ContentDigest::from_bytes(b"# Getting started\n");
        let b = ContentDigest::from_bytes(b"# Getting started\n");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), DIGEST_LEN);
    }

    #[test]
    fn test_digest_different_content() {
        let a = ContentDigest::from_bytes(b"one");
        let b = ContentDigest::from_bytes(b"two");
        assert_ne!(a, b);
    }

    #[test]
    fn test_digest_matches_is_case_insensitive() {
        let d = ContentDigest::from_bytes(b"hello");
        assert!(d.matches(&d.as_str().to_uppercase()));
        assert!(!d.matches("0000000000000000"));
    }

    #[test]
    fn test_digest_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "body").unwrap();
        let d = ContentDigest::from_file(&path).unwrap();
        assert_eq!(d, ContentDigest::from_bytes(b"body"));
    }
}

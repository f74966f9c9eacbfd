//! SHA-256 digest newtype for archive integrity checks.
//!
//! Validates that the value is a 64-character lowercase hexadecimal string
//! and provides helpers to hash bytes, readers and files.

use crate::error::{FormulaError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Expected length of a hex-encoded SHA-256 digest.
const DIGEST_HEX_LEN: usize = 64;

/// A validated hex-encoded SHA-256 digest string.
///
/// # Examples
///
/// ```
/// use todor_formula::digest::Sha256Digest;
///
/// let digest = Sha256Digest::of_bytes(b"todor");
/// assert_eq!(digest.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hash an in-memory buffer.
    #[must_use]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self::from_hasher(Sha256::new_with_prefix(bytes))
    }

    /// Hash everything a reader yields, in 8 KiB chunks.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if reading fails.
    pub fn of_reader(reader: &mut dyn Read) -> std::io::Result<Self> {
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];
        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(buffer.get(..bytes_read).unwrap_or_default());
        }
        Ok(Self::from_hasher(hasher))
    }

    /// Hash the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be opened or read.
    pub fn of_file(path: &Path) -> std::io::Result<Self> {
        let mut file = std::fs::File::open(path)?;
        Self::of_reader(&mut file)
    }

    // sha2 always yields 64 lowercase hex characters, so no validation.
    fn from_hasher(hasher: Sha256) -> Self {
        Self(format!("{:x}", hasher.finalize()))
    }
}

impl TryFrom<&str> for Sha256Digest {
    type Error = FormulaError;

    fn try_from(value: &str) -> Result<Self> {
        validate_sha256(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Sha256Digest {
    type Error = FormulaError;

    fn try_from(value: String) -> Result<Self> {
        validate_sha256(&value)?;
        Ok(Self(value))
    }
}

impl From<Sha256Digest> for String {
    fn from(value: Sha256Digest) -> Self {
        value.0
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate that `value` is a well-formed hex-encoded SHA-256 digest.
fn validate_sha256(value: &str) -> Result<()> {
    if value.len() != DIGEST_HEX_LEN {
        return Err(FormulaError::InvalidSha256Digest {
            reason: format!(
                "expected {DIGEST_HEX_LEN} hex characters, got {}",
                value.len()
            ),
        });
    }
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(FormulaError::InvalidSha256Digest {
            reason: format!("non-hex character '{bad}'"),
        });
    }
    if value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(FormulaError::InvalidSha256Digest {
            reason: "digest must be lowercase".to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn accepts_published_digest() {
        let digest =
            Sha256Digest::try_from("3a43293c8576f2ac612fef2f28582f2cc93d7b473dab9cb03cb981a8f3fbc87e");
        assert!(digest.is_ok());
    }

    #[rstest]
    #[case::too_short("abcdef".to_owned())]
    #[case::too_long("a".repeat(65))]
    #[case::non_hex(format!("{}g", "a".repeat(63)))]
    #[case::uppercase("A".repeat(64))]
    fn rejects_malformed_digests(#[case] value: String) {
        let result = Sha256Digest::try_from(value);
        assert!(matches!(
            result,
            Err(FormulaError::InvalidSha256Digest { .. })
        ));
    }

    #[test]
    fn hashes_empty_input() {
        assert_eq!(Sha256Digest::of_bytes(b"").as_str(), EMPTY_SHA256);
    }

    #[test]
    fn reader_and_bytes_agree_across_chunk_boundaries() {
        let payload = vec![7u8; 8192 * 2 + 17];
        let from_reader =
            Sha256Digest::of_reader(&mut payload.as_slice()).expect("reading a slice succeeds");
        assert_eq!(from_reader, Sha256Digest::of_bytes(&payload));
    }

    #[test]
    fn hashes_file_contents() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("archive.tar.gz");
        std::fs::write(&path, b"archive bytes").expect("write file");
        let digest = Sha256Digest::of_file(&path).expect("hash file");
        assert_eq!(digest, Sha256Digest::of_bytes(b"archive bytes"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = Sha256Digest::of_file(&dir.path().join("absent"));
        assert!(result.is_err());
    }
}

//! Integrity verification for downloaded release archives.
//!
//! Every archive is hashed and compared with the digest pinned in its
//! formula record before extraction. There is no way to skip the check: a
//! mismatch aborts the install while the archive still sits in a temporary
//! directory, so nothing reaches the prefix.

use std::path::Path;

use todor_formula::digest::Sha256Digest;

use crate::error::{InstallerError, Result};

/// Hash the archive at `path` and compare it with `expected`.
///
/// Returns the computed digest on success.
///
/// # Errors
///
/// Returns [`InstallerError::ChecksumMismatch`] when the digests differ and
/// [`InstallerError::Io`] when the archive cannot be read.
///
/// # Examples
///
/// ```
/// use todor_formula::digest::Sha256Digest;
/// use todor_installer::artefact::verification::verify_archive;
///
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("todor.tar.gz");
/// std::fs::write(&path, b"archive bytes")?;
///
/// let expected = Sha256Digest::of_bytes(b"archive bytes");
/// assert_eq!(verify_archive(&path, &expected)?, expected);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn verify_archive(path: &Path, expected: &Sha256Digest) -> Result<Sha256Digest> {
    let actual = Sha256Digest::of_file(path)?;
    if actual != *expected {
        log::debug!(
            target: "verification",
            "digest mismatch for {}: expected {expected}, got {actual}",
            path.display()
        );
        return Err(InstallerError::ChecksumMismatch {
            archive: archive_label(path),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    log::trace!(target: "verification", "verified {} ({actual})", path.display());
    Ok(actual)
}

fn archive_label(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| {
            name.to_string_lossy().into_owned()
        })
}

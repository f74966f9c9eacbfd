//! Error types for the todor installer CLI.
//!
//! This module defines semantic error variants that provide actionable guidance
//! to users when installation fails. Each error includes recovery hints where
//! applicable.

use crate::artefact::download::DownloadError;
use crate::artefact::extraction::ExtractionError;
use crate::artefact::packaging_error::PackagingError;
use crate::receipt::ReceiptError;
use camino::Utf8PathBuf;
use thiserror::Error;
use todor_formula::FormulaError;

/// Errors that can occur during the installation process.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// A formula record was invalid, missing, or inconsistent.
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// The release archive could not be downloaded.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The downloaded archive does not match the pinned digest.
    #[error(
        "checksum mismatch for {archive}: expected {expected}, got {actual}; nothing was installed"
    )]
    ChecksumMismatch {
        /// Archive file name.
        archive: String,
        /// Digest pinned in the formula record.
        expected: String,
        /// Digest of the downloaded bytes.
        actual: String,
    },

    /// The archive could not be unpacked.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// A file named by an install mapping is not in the archive.
    #[error("release archive for {formula} does not contain {source_path}; nothing was installed")]
    MissingArchiveEntry {
        /// Formula name and version.
        formula: String,
        /// Archive-relative path the mapping expected.
        source_path: String,
    },

    /// A destination file exists and belongs to something else.
    #[error("refusing to overwrite {path}, which todor-installer did not install; rerun with --overwrite to replace it")]
    ConflictingFile {
        /// The destination that already exists.
        path: Utf8PathBuf,
    },

    /// A formula declared as conflicting is already installed.
    #[error("{name} conflicts with installed formula {other}; uninstall it first")]
    FormulaConflict {
        /// The formula being installed.
        name: String,
        /// The installed formula it conflicts with.
        other: String,
    },

    /// Copying a file into the prefix failed.
    #[error("failed to install {path}: {source}")]
    PlacementFailed {
        /// Destination being written.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The prefix directory exists but is not writable.
    #[error("prefix {path} is not writable: {reason}")]
    PrefixNotWritable {
        /// Path to the non-writable directory.
        path: Utf8PathBuf,
        /// Description of the underlying I/O error.
        reason: String,
    },

    /// No installation prefix could be determined.
    #[error("could not determine an installation prefix; pass --prefix or set TODOR_TAP_PREFIX")]
    NoPrefix,

    /// Uninstall was requested for a formula that has no receipt.
    #[error("{name} is not installed in {prefix}")]
    NotInstalled {
        /// Formula name.
        name: String,
        /// The prefix that was searched.
        prefix: Utf8PathBuf,
    },

    /// Reading or writing install receipts failed.
    #[error(transparent)]
    Receipt(#[from] ReceiptError),

    /// Building a release archive failed.
    #[error(transparent)]
    Packaging(#[from] PackagingError),

    /// The configuration file could not be read or parsed.
    #[error("invalid configuration at {path}: {reason}")]
    InvalidConfig {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// Description of the parse or read error.
        reason: String,
    },

    /// An audit found errors in one or more records.
    #[error("audit found {count} error(s)")]
    AuditFailed {
        /// Number of error-level findings.
        count: usize,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write output.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_mismatch_states_nothing_was_installed() {
        let err = InstallerError::ChecksumMismatch {
            archive: "todor-v0.6.0-x86_64-unknown-linux-gnu.tar.gz".to_owned(),
            expected: "a".repeat(64),
            actual: "b".repeat(64),
        };
        let msg = err.to_string();
        assert!(msg.contains("todor-v0.6.0-x86_64-unknown-linux-gnu.tar.gz"));
        assert!(msg.contains(&"a".repeat(64)));
        assert!(msg.contains("nothing was installed"));
    }

    #[test]
    fn conflicting_file_suggests_overwrite() {
        let err = InstallerError::ConflictingFile {
            path: Utf8PathBuf::from("/opt/todor/bin/todor"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/opt/todor/bin/todor"));
        assert!(msg.contains("--overwrite"));
    }

    #[test]
    fn formula_errors_pass_through_unchanged() {
        let inner = FormulaError::EmptyHistory;
        let expected = inner.to_string();
        let err = InstallerError::from(inner);
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn placement_failed_preserves_source() {
        let err = InstallerError::PlacementFailed {
            path: Utf8PathBuf::from("/opt/todor/bin/todor"),
            source: std::io::Error::other("disk full"),
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn write_failed_includes_reason() {
        let source = std::io::Error::other("broken pipe");
        let err = InstallerError::WriteFailed { source };
        assert!(err.to_string().contains("write"));
        assert!(std::error::Error::source(&err).is_some());
    }
}

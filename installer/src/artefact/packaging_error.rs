//! Error types for release packaging operations.
//!
//! Covers I/O failures and validation errors that can occur when creating
//! `.tar.gz` release archives.

use thiserror::Error;

/// Errors arising from release packaging operations.
#[derive(Debug, Error)]
pub enum PackagingError {
    /// An I/O operation failed (reading source files, writing the archive).
    #[error("I/O error during packaging: {0}")]
    Io(#[from] std::io::Error),

    /// No files were provided for packaging.
    #[error("no files provided for packaging")]
    EmptyFileList,

    /// An input path has no filename component.
    #[error("input path has no filename: {0}")]
    InvalidInputPath(std::path::PathBuf),

    /// Two inputs would land on the same path inside the archive.
    #[error("duplicate archive entry: {0}")]
    DuplicateEntry(String),
}

//! Release archive handling: download, verification, extraction and packaging.
//!
//! # Sub-modules
//!
//! - [`download`] - Downloader trait and HTTP implementation.
//! - [`verification`] - SHA-256 check against the pinned digest.
//! - [`extraction`] - `.tar.gz` extraction with path traversal protection.
//! - [`packaging`] - Release archive creation.
//! - [`packaging_error`] - Error types for packaging operations.

pub mod download;
pub mod extraction;
pub mod packaging;
pub mod packaging_error;
pub mod verification;

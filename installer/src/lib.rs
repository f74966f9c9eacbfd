//! todor installer library.
//!
//! This crate downloads prebuilt todor release archives, verifies them
//! against the SHA-256 digests pinned in formula records, and places the
//! binary and its shell completions into a prefix. It is used by the
//! `todor-installer` CLI binary and can be consumed programmatically for
//! testing or custom installation workflows.
//!
//! # Modules
//!
//! - [`artefact`] - Archive download, verification, extraction, and packaging
//! - [`audit`] - Offline and online consistency checks over formula records
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Persistent configuration and prefix resolution
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`error`] - Semantic error types with recovery hints
//! - [`layout`] - Directory layout of an installation prefix
//! - [`list`] - Listing of installed formulae
//! - [`list_output`] - Output formatting for installed-formula listing
//! - [`logging`] - Diagnostic logging setup
//! - [`output`] - Progress and dry-run messages
//! - [`pipeline`] - Install orchestration
//! - [`placement`] - Conflict checks and file placement into a prefix
//! - [`receipt`] - Install receipts and the prefix lock
//! - [`uninstall`] - Removal of installed formulae

pub mod artefact;
pub mod audit;
pub mod cli;
pub mod config;
pub mod dirs;
pub mod error;
pub mod layout;
pub mod list;
pub mod list_output;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod placement;
pub mod receipt;
pub mod uninstall;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

//! Error types for formula records and their history.
//!
//! Each variant names the offending value and the rule it broke so that
//! audit output and installer errors can be shown to users unchanged.

use thiserror::Error;

/// Errors arising from invalid or inconsistent formula data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// A version string is not a valid semantic version.
    #[error("invalid version \"{value}\": {reason}")]
    InvalidVersion {
        /// The rejected version string.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// The target triple is not one the release archives are built for.
    #[error("unsupported target triple \"{value}\"; expected one of: {expected}")]
    UnsupportedTarget {
        /// The rejected triple string.
        value: String,
        /// Comma-separated list of accepted triples.
        expected: String,
    },

    /// The host platform has no matching release archive.
    #[error("no release archive for {platform}; supported targets: {expected}")]
    UnsupportedPlatform {
        /// Description of the host or target that could not be served.
        platform: String,
        /// Comma-separated list of targets the record provides.
        expected: String,
    },

    /// A SHA-256 digest is not a valid 64-character hex string.
    #[error("invalid SHA-256 digest: {reason}")]
    InvalidSha256Digest {
        /// Description of the validation failure.
        reason: String,
    },

    /// A URL template is empty or uses an unknown placeholder.
    #[error("invalid URL template \"{value}\": {reason}")]
    InvalidUrlTemplate {
        /// The rejected template.
        value: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// An install mapping points outside the archive or is empty.
    #[error("invalid install mapping \"{source_path}\": {reason}")]
    InvalidMapping {
        /// The rejected archive-relative source path.
        source_path: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A record file could not be parsed.
    #[error("failed to parse formula record{origin}: {reason}")]
    Parse {
        /// Where the record came from, formatted as ` from <path>` or empty.
        origin: String,
        /// The TOML parser's message.
        reason: String,
    },

    /// A record could not be serialised back to TOML.
    #[error("failed to serialise formula record: {reason}")]
    Serialise {
        /// The TOML serialiser's message.
        reason: String,
    },

    /// A record for an already published version differs from the original.
    #[error("formula {name} {version} is already published with different contents")]
    RecordMutated {
        /// Formula name.
        name: String,
        /// The version whose record changed.
        version: String,
    },

    /// A history mixes records for different formula names.
    #[error("formula history for {expected} cannot hold a record for {found}")]
    MixedFormulae {
        /// The name the history was started with.
        expected: String,
        /// The name of the rejected record.
        found: String,
    },

    /// The requested version is not present in the history.
    #[error("no formula record for version {version}")]
    UnknownVersion {
        /// The version that was requested.
        version: String,
    },

    /// The history holds no records at all.
    #[error("formula history is empty")]
    EmptyHistory,

    /// Reading a record directory failed.
    #[error("failed to read formula records from {path}: {reason}")]
    ReadRecords {
        /// Directory or file that could not be read.
        path: String,
        /// Description of the I/O failure.
        reason: String,
    },
}

/// Result type alias using [`FormulaError`].
pub type Result<T> = std::result::Result<T, FormulaError>;

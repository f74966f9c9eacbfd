//! Formula records for todor release archives.
//!
//! A formula record pins one published release: its version, the archive
//! URL for each supported platform, the SHA-256 digest every archive must
//! match, and the files copied out of the archive on install. Records are
//! immutable once published; a new release adds a new record.
//!
//! # Modules
//!
//! - [`audit`] - Offline consistency checks over records
//! - [`digest`] - SHA-256 digest newtype and hashing helpers
//! - [`error`] - Validation and history errors
//! - [`history`] - Version-keyed record history with bundled releases
//! - [`mapping`] - Archive entry to install directory mappings
//! - [`record`] - The formula record and platform resolution
//! - [`render`] - Homebrew Ruby formula rendering
//! - [`target`] - Supported target triples and host detection
//! - [`url`] - URL templates and archive naming
//! - [`version`] - Semantic version newtype

pub mod audit;
pub mod digest;
pub mod error;
pub mod history;
pub mod mapping;
pub mod record;
pub mod render;
pub mod target;
pub mod url;
pub mod version;

pub use error::{FormulaError, Result};
pub use history::FormulaHistory;
pub use record::{FormulaRecord, PlatformAsset, ResolvedAsset};

//! Install mappings from archive entries to installation directories.

use crate::error::{FormulaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an installed file lands inside the prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallLocation {
    /// The executable directory.
    Bin,
    /// The bash completion directory.
    BashCompletion,
    /// The fish completion directory.
    FishCompletion,
    /// The zsh completion directory.
    ZshCompletion,
}

impl InstallLocation {
    /// All locations, in the order formulae conventionally list them.
    pub const ALL: [Self; 4] = [
        Self::Bin,
        Self::BashCompletion,
        Self::FishCompletion,
        Self::ZshCompletion,
    ];

    /// Whether files in this location must be executable.
    #[must_use]
    pub fn is_executable(self) -> bool {
        matches!(self, Self::Bin)
    }
}

impl fmt::Display for InstallLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bin => "bin",
            Self::BashCompletion => "bash-completion",
            Self::FishCompletion => "fish-completion",
            Self::ZshCompletion => "zsh-completion",
        };
        f.write_str(name)
    }
}

/// One file-copy step: an archive entry and the directory it installs into.
///
/// # Examples
///
/// ```
/// use todor_formula::mapping::{InstallLocation, InstallMapping};
///
/// let mapping = InstallMapping::new("complete/_todor", InstallLocation::ZshCompletion)
///     .expect("valid mapping");
/// assert_eq!(mapping.installed_name(), "_todor");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMapping", into = "RawMapping")]
pub struct InstallMapping {
    source: String,
    location: InstallLocation,
    rename: Option<String>,
}

impl InstallMapping {
    /// Create a mapping that keeps the entry's file name.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::InvalidMapping`] when `source` is empty,
    /// absolute, or escapes the archive with `..`.
    pub fn new(source: impl Into<String>, location: InstallLocation) -> Result<Self> {
        Self::with_rename(source, location, None)
    }

    /// Create a mapping that installs the entry under a different name.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::InvalidMapping`] when `source` is invalid or
    /// `rename` is not a plain file name.
    pub fn with_rename(
        source: impl Into<String>,
        location: InstallLocation,
        rename: Option<String>,
    ) -> Result<Self> {
        let source = source.into();
        validate_source(&source)?;
        if let Some(name) = rename.as_deref() {
            validate_rename(&source, name)?;
        }
        Ok(Self {
            source,
            location,
            rename,
        })
    }

    /// Archive-relative path of the entry, using `/` separators.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Directory the entry installs into.
    #[must_use]
    pub fn location(&self) -> InstallLocation {
        self.location
    }

    /// Explicit installed name, if any.
    #[must_use]
    pub fn rename(&self) -> Option<&str> {
        self.rename.as_deref()
    }

    /// File name the entry has once installed.
    #[must_use]
    pub fn installed_name(&self) -> &str {
        self.rename
            .as_deref()
            .or_else(|| self.source.rsplit('/').next())
            .unwrap_or(&self.source)
    }
}

impl fmt::Display for InstallMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}/{}", self.source, self.location, self.installed_name())
    }
}

/// Serialised shape of an [`InstallMapping`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMapping {
    source: String,
    location: InstallLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rename: Option<String>,
}

impl TryFrom<RawMapping> for InstallMapping {
    type Error = FormulaError;

    fn try_from(raw: RawMapping) -> Result<Self> {
        Self::with_rename(raw.source, raw.location, raw.rename)
    }
}

impl From<InstallMapping> for RawMapping {
    fn from(mapping: InstallMapping) -> Self {
        Self {
            source: mapping.source,
            location: mapping.location,
            rename: mapping.rename,
        }
    }
}

fn invalid(source: &str, reason: &str) -> FormulaError {
    FormulaError::InvalidMapping {
        source_path: source.to_owned(),
        reason: reason.to_owned(),
    }
}

fn validate_source(source: &str) -> Result<()> {
    if source.is_empty() {
        return Err(invalid(source, "source must not be empty"));
    }
    if source.starts_with('/') || source.contains('\\') || source.contains(':') {
        return Err(invalid(source, "source must be a relative archive path"));
    }
    if source.split('/').any(|part| part == "..") {
        return Err(invalid(source, "source must not leave the archive"));
    }
    if source.ends_with('/') || source.split('/').any(|part| part == ".") {
        return Err(invalid(source, "source must name a file, not a directory"));
    }
    Ok(())
}

fn validate_rename(source: &str, name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(invalid(source, "rename must be a plain file name"));
    }
    Ok(())
}

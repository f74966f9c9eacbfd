//! Release version newtype.
//!
//! Versions follow semantic versioning. Ordering uses semver precedence so
//! that a history can report its latest release without string tricks.

use crate::error::{FormulaError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A validated semantic version for a published release.
///
/// # Examples
///
/// ```
/// use todor_formula::version::Version;
///
/// let version: Version = "0.6.0".try_into().expect("valid version");
/// assert_eq!(version.to_string(), "0.6.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version(semver::Version);

impl Version {
    /// Return the underlying semver value.
    #[must_use]
    pub fn as_semver(&self) -> &semver::Version {
        &self.0
    }

    /// Whether this version carries a pre-release tag such as `-rc.1`.
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        !self.0.pre.is_empty()
    }
}

impl TryFrom<&str> for Version {
    type Error = FormulaError;

    fn try_from(value: &str) -> Result<Self> {
        if value.is_empty() {
            return Err(FormulaError::InvalidVersion {
                value: value.to_owned(),
                reason: "version must not be empty".to_owned(),
            });
        }
        if value.starts_with('v') {
            return Err(FormulaError::InvalidVersion {
                value: value.to_owned(),
                reason: "drop the leading 'v'; URL templates add it where needed".to_owned(),
            });
        }
        semver::Version::parse(value)
            .map(Self)
            .map_err(|e| FormulaError::InvalidVersion {
                value: value.to_owned(),
                reason: e.to_string(),
            })
    }
}

impl TryFrom<String> for Version {
    type Error = FormulaError;

    fn try_from(value: String) -> Result<Self> {
        Self::try_from(value.as_str())
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::release("0.6.0")]
    #[case::older("0.5.1")]
    #[case::prerelease("1.0.0-rc.1")]
    #[case::build_metadata("1.2.3+build.7")]
    fn accepts_semantic_versions(#[case] value: &str) {
        let version = Version::try_from(value).expect("valid version");
        assert_eq!(version.to_string(), value);
    }

    #[rstest]
    #[case::empty("")]
    #[case::leading_v("v0.6.0")]
    #[case::missing_patch("0.6")]
    #[case::non_numeric("zero.six.one")]
    fn rejects_malformed_versions(#[case] value: &str) {
        let result = Version::try_from(value);
        assert!(
            matches!(result, Err(FormulaError::InvalidVersion { .. })),
            "expected InvalidVersion for {value:?}"
        );
    }

    #[test]
    fn orders_by_semver_precedence() {
        let older = Version::try_from("0.5.1").expect("valid");
        let newer = Version::try_from("0.10.0").expect("valid");
        let candidate = Version::try_from("0.10.0-rc.1").expect("valid");
        assert!(older < newer);
        assert!(candidate < newer);
        assert!(candidate.is_prerelease());
    }
}

//! Target triple validation and host platform selection.
//!
//! Release archives exist for two triples only. The host platform is mapped
//! onto one of them, or rejected when no archive can run on it.

use crate::error::{FormulaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The target triples that release archives are published for.
const SUPPORTED_TARGETS: &[&str] = &["x86_64-apple-darwin", "x86_64-unknown-linux-gnu"];

/// Operating system family of a target triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetOs {
    /// macOS (`*-apple-darwin`).
    MacOs,
    /// Linux (`*-linux-*`).
    Linux,
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOs => write!(f, "macos"),
            Self::Linux => write!(f, "linux"),
        }
    }
}

/// A validated target triple from the supported set.
///
/// # Examples
///
/// ```
/// use todor_formula::target::TargetTriple;
///
/// let triple: TargetTriple = "x86_64-unknown-linux-gnu"
///     .try_into()
///     .expect("valid target triple");
/// assert_eq!(triple.as_str(), "x86_64-unknown-linux-gnu");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetTriple(String);

impl TargetTriple {
    /// Return the triple as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the full list of supported target triples.
    #[must_use]
    pub fn supported() -> &'static [&'static str] {
        SUPPORTED_TARGETS
    }

    /// Return the operating system family of this triple.
    #[must_use]
    pub fn os(&self) -> TargetOs {
        if self.0.contains("darwin") {
            TargetOs::MacOs
        } else {
            TargetOs::Linux
        }
    }
}

impl TryFrom<&str> for TargetTriple {
    type Error = FormulaError;

    fn try_from(value: &str) -> Result<Self> {
        if SUPPORTED_TARGETS.contains(&value) {
            Ok(Self(value.to_owned()))
        } else {
            Err(FormulaError::UnsupportedTarget {
                value: value.to_owned(),
                expected: SUPPORTED_TARGETS.join(", "),
            })
        }
    }
}

impl TryFrom<String> for TargetTriple {
    type Error = FormulaError;

    fn try_from(value: String) -> Result<Self> {
        Self::try_from(value.as_str())
    }
}

impl From<TargetTriple> for String {
    fn from(value: TargetTriple) -> Self {
        value.0
    }
}

impl AsRef<str> for TargetTriple {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The operating system and CPU architecture of the installing machine.
///
/// Values use the spelling of [`std::env::consts::OS`] and
/// [`std::env::consts::ARCH`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlatform {
    os: String,
    arch: String,
}

impl HostPlatform {
    /// Describe an arbitrary host, mainly for tests and `--target` dry runs.
    #[must_use]
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Describe the machine this binary is running on.
    #[must_use]
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Map the host onto the release archive that runs on it.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::UnsupportedPlatform`] when no published
    /// archive targets this operating system and architecture.
    ///
    /// # Examples
    ///
    /// ```
    /// use todor_formula::target::HostPlatform;
    ///
    /// let host = HostPlatform::new("linux", "x86_64");
    /// assert_eq!(host.target().expect("supported").as_str(), "x86_64-unknown-linux-gnu");
    /// assert!(HostPlatform::new("windows", "x86_64").target().is_err());
    /// ```
    pub fn target(&self) -> Result<TargetTriple> {
        let triple = match (self.os.as_str(), self.arch.as_str()) {
            ("macos", "x86_64") => "x86_64-apple-darwin",
            ("linux", "x86_64") => "x86_64-unknown-linux-gnu",
            _ => {
                return Err(FormulaError::UnsupportedPlatform {
                    platform: self.to_string(),
                    expected: SUPPORTED_TARGETS.join(", "),
                });
            }
        };
        TargetTriple::try_from(triple)
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn accepts_all_supported_targets() {
        for target in SUPPORTED_TARGETS {
            let triple = TargetTriple::try_from(*target).expect("supported target");
            assert_eq!(triple.as_str(), *target);
        }
    }

    #[rstest]
    #[case::wasm("wasm32-unknown-unknown")]
    #[case::apple_silicon("aarch64-apple-darwin")]
    #[case::empty("")]
    fn rejects_unpublished_targets(#[case] value: &str) {
        let result = TargetTriple::try_from(value);
        assert!(matches!(
            result,
            Err(FormulaError::UnsupportedTarget { .. })
        ));
    }

    #[rstest]
    #[case::darwin("x86_64-apple-darwin", TargetOs::MacOs)]
    #[case::linux("x86_64-unknown-linux-gnu", TargetOs::Linux)]
    fn reports_os_family(#[case] triple: &str, #[case] os: TargetOs) {
        let target = TargetTriple::try_from(triple).expect("valid");
        assert_eq!(target.os(), os);
    }

    #[rstest]
    #[case::mac("macos", "x86_64", "x86_64-apple-darwin")]
    #[case::linux("linux", "x86_64", "x86_64-unknown-linux-gnu")]
    fn maps_supported_hosts(#[case] os: &str, #[case] arch: &str, #[case] expected: &str) {
        let target = HostPlatform::new(os, arch).target().expect("supported host");
        assert_eq!(target.as_str(), expected);
    }

    #[rstest]
    #[case::windows("windows", "x86_64")]
    #[case::apple_silicon("macos", "aarch64")]
    #[case::freebsd("freebsd", "x86_64")]
    fn rejects_unsupported_hosts(#[case] os: &str, #[case] arch: &str) {
        let err = HostPlatform::new(os, arch)
            .target()
            .expect_err("host should be rejected");
        assert!(err.to_string().contains(&format!("{os}/{arch}")));
    }
}

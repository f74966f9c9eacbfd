//! Download URL templates and the archive naming convention.
//!
//! A template may interpolate `{version}` and `{target}`. A template with no
//! placeholders is a hardcoded URL; audits then check that the version
//! appears in it textually.

use crate::error::{FormulaError, Result};
use crate::target::TargetTriple;
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder replaced by the record's version.
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Placeholder replaced by the target triple.
pub const TARGET_PLACEHOLDER: &str = "{target}";

/// The fixed file extension of release archives.
pub const ARCHIVE_EXTENSION: &str = ".tar.gz";

/// Build the conventional release archive file name.
///
/// # Examples
///
/// ```
/// use todor_formula::target::TargetTriple;
/// use todor_formula::url::archive_name;
/// use todor_formula::version::Version;
///
/// let version = Version::try_from("0.6.0").expect("valid");
/// let target = TargetTriple::try_from("x86_64-apple-darwin").expect("valid");
/// assert_eq!(
///     archive_name("todor", &version, &target),
///     "todor-v0.6.0-x86_64-apple-darwin.tar.gz"
/// );
/// ```
#[must_use]
pub fn archive_name(name: &str, version: &Version, target: &TargetTriple) -> String {
    format!("{name}-v{version}-{target}{ARCHIVE_EXTENSION}")
}

/// A download URL with optional `{version}` and `{target}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UrlTemplate(String);

impl UrlTemplate {
    /// Return the raw template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the version is interpolated rather than hardcoded.
    #[must_use]
    pub fn is_interpolated(&self) -> bool {
        self.0.contains(VERSION_PLACEHOLDER)
    }

    /// Substitute every placeholder.
    ///
    /// # Examples
    ///
    /// ```
    /// use todor_formula::target::TargetTriple;
    /// use todor_formula::url::UrlTemplate;
    /// use todor_formula::version::Version;
    ///
    /// let template = UrlTemplate::try_from(
    ///     "https://example.test/v{version}/todor-v{version}-{target}.tar.gz",
    /// )
    /// .expect("valid template");
    /// let url = template.render(
    ///     &Version::try_from("0.6.0").expect("valid"),
    ///     &TargetTriple::try_from("x86_64-unknown-linux-gnu").expect("valid"),
    /// );
    /// assert_eq!(
    ///     url,
    ///     "https://example.test/v0.6.0/todor-v0.6.0-x86_64-unknown-linux-gnu.tar.gz"
    /// );
    /// ```
    #[must_use]
    pub fn render(&self, version: &Version, target: &TargetTriple) -> String {
        self.0
            .replace(VERSION_PLACEHOLDER, &version.to_string())
            .replace(TARGET_PLACEHOLDER, target.as_str())
    }
}

impl TryFrom<&str> for UrlTemplate {
    type Error = FormulaError;

    fn try_from(value: &str) -> Result<Self> {
        validate_template(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for UrlTemplate {
    type Error = FormulaError;

    fn try_from(value: String) -> Result<Self> {
        validate_template(&value)?;
        Ok(Self(value))
    }
}

impl From<UrlTemplate> for String {
    fn from(value: UrlTemplate) -> Self {
        value.0
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn invalid(value: &str, reason: impl Into<String>) -> FormulaError {
    FormulaError::InvalidUrlTemplate {
        value: value.to_owned(),
        reason: reason.into(),
    }
}

fn validate_template(value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(value, "URL must not be empty"));
    }
    if !value.starts_with("https://") && !value.starts_with("http://") {
        return Err(invalid(value, "URL must use http or https"));
    }

    let mut rest = value;
    while let Some(open) = rest.find('{') {
        let after_open = rest.get(open..).unwrap_or_default();
        let Some(close) = after_open.find('}') else {
            return Err(invalid(value, "unterminated placeholder"));
        };
        let placeholder = after_open.get(..=close).unwrap_or_default();
        if placeholder != VERSION_PLACEHOLDER && placeholder != TARGET_PLACEHOLDER {
            return Err(invalid(
                value,
                format!("unknown placeholder {placeholder}; use {VERSION_PLACEHOLDER} or {TARGET_PLACEHOLDER}"),
            ));
        }
        rest = after_open.get(close + 1..).unwrap_or_default();
    }
    if rest.contains('}') {
        return Err(invalid(value, "unbalanced '}'"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const RELEASE_TEMPLATE: &str = "https://github.com/lavifb/todo_r/releases/download/v{version}/todor-v{version}-{target}.tar.gz";

    #[test]
    fn renders_release_url() {
        let template = UrlTemplate::try_from(RELEASE_TEMPLATE).expect("valid");
        let url = template.render(
            &Version::try_from("0.6.0").expect("valid"),
            &TargetTriple::try_from("x86_64-apple-darwin").expect("valid"),
        );
        assert_eq!(
            url,
            "https://github.com/lavifb/todo_r/releases/download/v0.6.0/todor-v0.6.0-x86_64-apple-darwin.tar.gz"
        );
        assert!(template.is_interpolated());
    }

    #[test]
    fn hardcoded_url_is_not_interpolated() {
        let template = UrlTemplate::try_from(
            "https://example.test/v0.5.1/todor-v0.5.1-x86_64-apple-darwin.tar.gz",
        )
        .expect("valid");
        assert!(!template.is_interpolated());
    }

    #[rstest]
    #[case::empty("")]
    #[case::not_http("ftp://example.test/todor.tar.gz")]
    #[case::unknown_placeholder("https://example.test/{name}.tar.gz")]
    #[case::ruby_interpolation("https://example.test/v#{version}.tar.gz{")]
    #[case::stray_close("https://example.test/v}.tar.gz")]
    fn rejects_invalid_templates(#[case] value: &str) {
        let result = UrlTemplate::try_from(value);
        assert!(
            matches!(result, Err(FormulaError::InvalidUrlTemplate { .. })),
            "expected rejection for {value:?}"
        );
    }
}

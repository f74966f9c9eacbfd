//! Formula records: one published release of a packaged binary.
//!
//! A record is read from TOML, validated while deserialising, and never
//! edited afterwards. Platform selection and URL interpolation happen in
//! [`FormulaRecord::resolve`].

use crate::digest::Sha256Digest;
use crate::error::{FormulaError, Result};
use crate::mapping::{InstallLocation, InstallMapping};
use crate::target::TargetTriple;
use crate::url::{UrlTemplate, archive_name};
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Download details for one platform branch of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformAsset {
    /// Pinned digest of the archive for this platform.
    pub sha256: Sha256Digest,
    /// Per-platform URL, used instead of the record template when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<UrlTemplate>,
}

/// A published formula revision.
///
/// # Examples
///
/// ```
/// use todor_formula::record::FormulaRecord;
///
/// let record = FormulaRecord::from_toml_str(r#"
/// name = "todor"
/// version = "0.6.0"
/// desc = "Find all your TODO notes with one command!"
/// homepage = "https://github.com/lavifb/todo_r"
/// url = "https://example.test/v{version}/todor-v{version}-{target}.tar.gz"
///
/// [platforms.x86_64-unknown-linux-gnu]
/// sha256 = "80bf5e63811432cb29927bc3b9051a4123601e0fb749a0382829d73c55650c55"
///
/// [[install]]
/// source = "todor"
/// location = "bin"
/// "#).expect("valid record");
///
/// assert_eq!(record.class_name(), "Todor");
/// assert_eq!(record.version().to_string(), "0.6.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormulaRecord {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    class: Option<String>,
    version: Version,
    desc: String,
    homepage: String,
    url: UrlTemplate,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    conflicts_with: Vec<String>,
    platforms: BTreeMap<TargetTriple, PlatformAsset>,
    #[serde(default)]
    install: Vec<InstallMapping>,
}

/// The concrete download for one record on one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    /// Formula name.
    pub name: String,
    /// Release version.
    pub version: Version,
    /// Target triple the archive was built for.
    pub target: TargetTriple,
    /// Interpolated download URL.
    pub url: String,
    /// Pinned digest the downloaded archive must match.
    pub sha256: Sha256Digest,
    /// Conventional archive file name.
    pub archive_name: String,
}

impl FormulaRecord {
    /// Parse and validate a record from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::Parse`] when the TOML is malformed, has
    /// unknown keys, or any field fails validation.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Self::parse(source, String::new())
    }

    /// Read and validate a record file.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::ReadRecords`] when the file cannot be read
    /// and [`FormulaError::Parse`] when it is not a valid record.
    pub fn from_path(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| FormulaError::ReadRecords {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&source, format!(" from {}", path.display()))
    }

    fn parse(source: &str, origin: String) -> Result<Self> {
        let record: Self = toml::from_str(source).map_err(|e| FormulaError::Parse {
            origin: origin.clone(),
            reason: e.message().to_owned(),
        })?;
        if let Some(reason) = record.structural_problem() {
            return Err(FormulaError::Parse { origin, reason });
        }
        Ok(record)
    }

    fn structural_problem(&self) -> Option<String> {
        let valid_name = !self.name.is_empty()
            && self
                .name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if !valid_name {
            return Some(format!(
                "name \"{}\" must be non-empty lowercase ASCII, digits, '-' or '_'",
                self.name
            ));
        }
        if let Some(class) = self.class.as_deref() {
            let valid_class = class.chars().next().is_some_and(|c| c.is_ascii_uppercase())
                && class.chars().all(|c| c.is_ascii_alphanumeric());
            if !valid_class {
                return Some(format!("class \"{class}\" must be a CamelCase identifier"));
            }
        }
        None
    }

    /// Serialise the record back to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::Serialise`] if the TOML serialiser fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| FormulaError::Serialise {
            reason: e.to_string(),
        })
    }

    /// Formula name, which is also the archive file prefix.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ruby class name; derived from the formula name when not declared.
    #[must_use]
    pub fn class_name(&self) -> String {
        if let Some(class) = &self.class {
            return class.clone();
        }
        self.name
            .split(['-', '_'])
            .map(|part| {
                let mut chars = part.chars();
                chars.next().map_or_else(String::new, |first| {
                    first.to_ascii_uppercase().to_string() + chars.as_str()
                })
            })
            .collect()
    }

    /// Released version.
    #[must_use]
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// One-line description.
    #[must_use]
    pub fn desc(&self) -> &str {
        &self.desc
    }

    /// Project homepage.
    #[must_use]
    pub fn homepage(&self) -> &str {
        &self.homepage
    }

    /// Record-wide download URL template.
    #[must_use]
    pub fn url(&self) -> &UrlTemplate {
        &self.url
    }

    /// Formulae that may not be installed alongside this one.
    #[must_use]
    pub fn conflicts_with(&self) -> &[String] {
        &self.conflicts_with
    }

    /// Platform branches keyed by target triple.
    #[must_use]
    pub fn platforms(&self) -> &BTreeMap<TargetTriple, PlatformAsset> {
        &self.platforms
    }

    /// Ordered file-copy steps.
    #[must_use]
    pub fn install(&self) -> &[InstallMapping] {
        &self.install
    }

    /// Mappings that install into `location`.
    pub fn mappings_for(
        &self,
        location: InstallLocation,
    ) -> impl Iterator<Item = &InstallMapping> + '_ {
        self.install
            .iter()
            .filter(move |mapping| mapping.location() == location)
    }

    /// URL template that applies to `target`, honouring per-platform overrides.
    #[must_use]
    pub fn url_for(&self, target: &TargetTriple) -> &UrlTemplate {
        self.platforms
            .get(target)
            .and_then(|asset| asset.url.as_ref())
            .unwrap_or(&self.url)
    }

    /// Select the platform branch for `target` and interpolate its URL.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::UnsupportedPlatform`] when the record has no
    /// branch for `target`.
    pub fn resolve(&self, target: &TargetTriple) -> Result<ResolvedAsset> {
        let asset = self
            .platforms
            .get(target)
            .ok_or_else(|| FormulaError::UnsupportedPlatform {
                platform: format!("{} {} on {target}", self.name, self.version),
                expected: self.platform_list(),
            })?;
        let template = asset.url.as_ref().unwrap_or(&self.url);
        Ok(ResolvedAsset {
            name: self.name.clone(),
            version: self.version.clone(),
            target: target.clone(),
            url: template.render(&self.version, target),
            sha256: asset.sha256.clone(),
            archive_name: archive_name(&self.name, &self.version, target),
        })
    }

    fn platform_list(&self) -> String {
        self.platforms
            .keys()
            .map(TargetTriple::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

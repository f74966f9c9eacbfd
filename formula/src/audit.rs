//! Offline consistency checks for formula records.
//!
//! Checks that need the published archives (digest match, mapped entries
//! present) live in the installer, which can download them.

use crate::history::FormulaHistory;
use crate::mapping::InstallLocation;
use crate::record::FormulaRecord;
use crate::target::TargetTriple;
use std::collections::BTreeSet;
use std::fmt;

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Worth a look, but the record is installable.
    Warning,
    /// The record is inconsistent and must not be published.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Which rule produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Check {
    /// The URL must carry the declared version.
    UrlVersion,
    /// The URL must end in the conventional archive name.
    ArchiveName,
    /// The record must provide at least one platform branch.
    PlatformCoverage,
    /// Two mappings must not install the same file.
    MappingDestination,
    /// The record should install an executable.
    BinaryMapping,
    /// The downloaded archive must match the pinned digest.
    ArchiveDigest,
    /// Every mapped source must exist in the archive.
    ArchiveEntry,
    /// The archive could not be fetched or unpacked.
    ArchiveFetch,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UrlVersion => "url-version",
            Self::ArchiveName => "archive-name",
            Self::PlatformCoverage => "platform-coverage",
            Self::MappingDestination => "mapping-destination",
            Self::BinaryMapping => "binary-mapping",
            Self::ArchiveDigest => "archive-digest",
            Self::ArchiveEntry => "archive-entry",
            Self::ArchiveFetch => "archive-fetch",
        };
        f.write_str(name)
    }
}

/// One problem found in a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Version of the offending record.
    pub version: String,
    /// Platform branch involved, when the problem is platform-specific.
    pub target: Option<TargetTriple>,
    /// How serious the problem is.
    pub severity: Severity,
    /// Rule that fired.
    pub check: Check,
    /// Human-readable explanation.
    pub message: String,
}

impl Finding {
    /// Build a finding for `record`.
    #[must_use]
    pub fn new(
        record: &FormulaRecord,
        target: Option<&TargetTriple>,
        severity: Severity,
        check: Check,
        message: impl Into<String>,
    ) -> Self {
        Self {
            version: record.version().to_string(),
            target: target.cloned(),
            severity,
            check,
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.severity, self.check, self.version)?;
        if let Some(target) = &self.target {
            write!(f, " ({target})")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Whether any finding is an error.
#[must_use]
pub fn has_errors(findings: &[Finding]) -> bool {
    findings.iter().any(|f| f.severity == Severity::Error)
}

/// Run every offline check over every record in `history`.
#[must_use]
pub fn audit_history(history: &FormulaHistory) -> Vec<Finding> {
    history.iter().flat_map(audit_record).collect()
}

/// Run every offline check over one record.
///
/// # Examples
///
/// ```
/// use todor_formula::audit::{audit_record, has_errors};
/// use todor_formula::history::FormulaHistory;
///
/// let history = FormulaHistory::bundled().expect("bundled records");
/// let latest = history.latest().expect("non-empty");
/// assert!(!has_errors(&audit_record(latest)));
/// ```
#[must_use]
pub fn audit_record(record: &FormulaRecord) -> Vec<Finding> {
    let mut findings = Vec::new();
    check_platforms(record, &mut findings);
    for target in record.platforms().keys() {
        check_url_version(record, target, &mut findings);
        check_archive_name(record, target, &mut findings);
    }
    check_mappings(record, &mut findings);
    findings
}

fn check_platforms(record: &FormulaRecord, findings: &mut Vec<Finding>) {
    if record.platforms().is_empty() {
        findings.push(Finding::new(
            record,
            None,
            Severity::Error,
            Check::PlatformCoverage,
            "record declares no platform branches",
        ));
        return;
    }
    for supported in TargetTriple::supported() {
        let covered = record
            .platforms()
            .keys()
            .any(|target| target.as_str() == *supported);
        if !covered {
            findings.push(Finding::new(
                record,
                None,
                Severity::Warning,
                Check::PlatformCoverage,
                format!("no archive for {supported}"),
            ));
        }
    }
}

fn check_url_version(record: &FormulaRecord, target: &TargetTriple, findings: &mut Vec<Finding>) {
    let template = record.url_for(target);
    if template.is_interpolated() {
        return;
    }
    let version = record.version().to_string();
    if !template.as_str().contains(&version) {
        findings.push(Finding::new(
            record,
            Some(target),
            Severity::Error,
            Check::UrlVersion,
            format!("hardcoded URL {template} does not mention version {version}"),
        ));
    }
}

fn check_archive_name(record: &FormulaRecord, target: &TargetTriple, findings: &mut Vec<Finding>) {
    let Ok(asset) = record.resolve(target) else {
        return;
    };
    let file_name = asset.url.rsplit('/').next().unwrap_or_default();
    if file_name != asset.archive_name {
        findings.push(Finding::new(
            record,
            Some(target),
            Severity::Error,
            Check::ArchiveName,
            format!(
                "URL names archive {file_name:?}, expected {:?}",
                asset.archive_name
            ),
        ));
    }
}

fn check_mappings(record: &FormulaRecord, findings: &mut Vec<Finding>) {
    let mut seen = BTreeSet::new();
    for mapping in record.install() {
        if !seen.insert((mapping.location(), mapping.installed_name())) {
            findings.push(Finding::new(
                record,
                None,
                Severity::Error,
                Check::MappingDestination,
                format!(
                    "{} is installed more than once into {}",
                    mapping.installed_name(),
                    mapping.location()
                ),
            ));
        }
    }
    if record.mappings_for(InstallLocation::Bin).next().is_none() {
        findings.push(Finding::new(
            record,
            None,
            Severity::Warning,
            Check::BinaryMapping,
            "record installs no executable",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const BASE: &str = r#"
name = "todor"
version = "0.6.0"
desc = "Find all your TODO notes with one command!"
homepage = "https://github.com/lavifb/todo_r"
url = "https://github.com/lavifb/todo_r/releases/download/v{version}/todor-v{version}-{target}.tar.gz"

[platforms.x86_64-apple-darwin]
sha256 = "3a43293c8576f2ac612fef2f28582f2cc93d7b473dab9cb03cb981a8f3fbc87e"

[platforms.x86_64-unknown-linux-gnu]
sha256 = "80bf5e63811432cb29927bc3b9051a4123601e0fb749a0382829d73c55650c55"

[[install]]
source = "todor"
location = "bin"
"#;

    fn audit(source: &str) -> Vec<Finding> {
        let record = FormulaRecord::from_toml_str(source).expect("valid record");
        audit_record(&record)
    }

    fn checks(findings: &[Finding]) -> Vec<(Severity, Check)> {
        findings.iter().map(|f| (f.severity, f.check)).collect()
    }

    #[test]
    fn bundled_history_is_clean() {
        let history = FormulaHistory::bundled().expect("bundled");
        let findings = audit_history(&history);
        assert!(findings.is_empty(), "unexpected findings: {findings:?}");
    }

    #[test]
    fn consistent_record_has_no_findings() {
        assert!(audit(BASE).is_empty());
    }

    #[test]
    fn hardcoded_url_with_stale_version_is_an_error() {
        let source = BASE.replace(
            "[platforms.x86_64-unknown-linux-gnu]\n",
            "[platforms.x86_64-unknown-linux-gnu]\nurl = \"https://github.com/lavifb/todo_r/releases/download/v0.5.1/todor-v0.5.1-x86_64-unknown-linux-gnu.tar.gz\"\n",
        );
        let findings = audit(&source);
        assert!(checks(&findings).contains(&(Severity::Error, Check::UrlVersion)));
        assert!(checks(&findings).contains(&(Severity::Error, Check::ArchiveName)));
        assert!(has_errors(&findings));
    }

    #[test]
    fn consistent_hardcoded_url_passes() {
        let source = BASE.replace(
            "[platforms.x86_64-unknown-linux-gnu]\n",
            "[platforms.x86_64-unknown-linux-gnu]\nurl = \"https://mirror.test/v0.6.0/todor-v0.6.0-x86_64-unknown-linux-gnu.tar.gz\"\n",
        );
        assert!(audit(&source).is_empty());
    }

    #[test]
    fn wrong_archive_name_is_an_error() {
        let source = BASE.replace("todor-v{version}-{target}.tar.gz", "todor-{target}.tar.gz");
        let findings = audit(&source);
        assert_eq!(
            checks(&findings),
            vec![
                (Severity::Error, Check::ArchiveName),
                (Severity::Error, Check::ArchiveName)
            ]
        );
    }

    #[rstest]
    #[case::no_binary(
        "[[install]]\nsource = \"todor\"\nlocation = \"bin\"\n",
        "[[install]]\nsource = \"complete/_todor\"\nlocation = \"zsh-completion\"\n",
        Severity::Warning,
        Check::BinaryMapping
    )]
    #[case::duplicate_destination(
        "[[install]]\nsource = \"todor\"\nlocation = \"bin\"\n",
        "[[install]]\nsource = \"todor\"\nlocation = \"bin\"\n\n[[install]]\nsource = \"target/todor\"\nlocation = \"bin\"\n",
        Severity::Error,
        Check::MappingDestination
    )]
    fn mapping_problems_are_reported(
        #[case] from: &str,
        #[case] to: &str,
        #[case] severity: Severity,
        #[case] check: Check,
    ) {
        let findings = audit(&BASE.replace(from, to));
        assert_eq!(checks(&findings), vec![(severity, check)]);
    }

    #[test]
    fn missing_platform_is_a_warning() {
        let source = BASE.replace(
            "[platforms.x86_64-apple-darwin]\nsha256 = \"3a43293c8576f2ac612fef2f28582f2cc93d7b473dab9cb03cb981a8f3fbc87e\"\n",
            "",
        );
        let findings = audit(&source);
        assert_eq!(
            checks(&findings),
            vec![(Severity::Warning, Check::PlatformCoverage)]
        );
        assert!(!has_errors(&findings));
    }

    #[test]
    fn finding_display_includes_target() {
        let record = FormulaRecord::from_toml_str(BASE).expect("valid");
        let target = TargetTriple::try_from("x86_64-apple-darwin").expect("valid");
        let finding = Finding::new(
            &record,
            Some(&target),
            Severity::Error,
            Check::ArchiveDigest,
            "digest mismatch",
        );
        assert_eq!(
            finding.to_string(),
            "error [archive-digest] 0.6.0 (x86_64-apple-darwin): digest mismatch"
        );
    }
}

//! Audit command implementation.
//!
//! Runs the offline record checks over a formula history and, when asked,
//! the online checks that download each published archive. Findings go to
//! stdout one per line; any error-severity finding fails the command.

use std::io::Write;

use todor_formula::FormulaHistory;
use todor_formula::audit::{Finding, Severity, audit_history, has_errors};
use todor_formula::target::TargetTriple;

use crate::artefact::download::ArtefactDownloader;
use crate::artefact::extraction::ArtefactExtractor;
use crate::error::{InstallerError, Result};
use crate::pipeline::check_record_online;

/// Collaborators for the online half of an audit.
pub struct OnlineAudit<'a> {
    /// Fetches published archives.
    pub downloader: &'a dyn ArtefactDownloader,
    /// Unpacks them to look for mapped sources.
    pub extractor: &'a dyn ArtefactExtractor,
    /// Restrict the checks to one platform branch.
    pub target: Option<&'a TargetTriple>,
}

/// Collect every finding for `history`.
#[must_use]
pub fn collect_findings(
    history: &FormulaHistory,
    online: Option<&OnlineAudit<'_>>,
) -> Vec<Finding> {
    let mut findings = audit_history(history);
    let Some(online) = online else {
        return findings;
    };
    for record in history.iter() {
        let targets: Vec<&TargetTriple> = match online.target {
            Some(target) => vec![target],
            None => record.platforms().keys().collect(),
        };
        for target in targets {
            log::debug!(target: "audit", "checking {} {} online", record.version(), target);
            findings.extend(check_record_online(
                record,
                target,
                online.downloader,
                online.extractor,
            ));
        }
    }
    findings
}

/// Audit `history` and report to `stdout`.
///
/// # Errors
///
/// Returns [`InstallerError::AuditFailed`] when any finding is an error, or
/// [`InstallerError::WriteFailed`] when stdout cannot be written.
pub fn run_audit(
    history: &FormulaHistory,
    online: Option<&OnlineAudit<'_>>,
    stdout: &mut dyn Write,
) -> Result<()> {
    let findings = collect_findings(history, online);
    let write_failed = |source| InstallerError::WriteFailed { source };

    for finding in &findings {
        writeln!(stdout, "{finding}").map_err(write_failed)?;
    }
    if has_errors(&findings) {
        let count = findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count();
        return Err(InstallerError::AuditFailed { count });
    }
    writeln!(
        stdout,
        "{} record(s) checked, {} warning(s)",
        history.len(),
        findings.len()
    )
    .map_err(write_failed)?;
    Ok(())
}

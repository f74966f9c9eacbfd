//! Install pipeline orchestration.
//!
//! Selects a formula record, resolves the host's platform branch, downloads
//! the archive into a temporary directory, verifies its digest, extracts it,
//! and places the mapped files into the prefix. The digest check happens
//! before extraction; a mismatch leaves the prefix untouched.

use std::io::Write;
use std::path::Path;

use camino::Utf8PathBuf;
use todor_formula::audit::{Check, Finding, Severity};
use todor_formula::digest::Sha256Digest;
use todor_formula::target::{HostPlatform, TargetTriple};
use todor_formula::version::Version;
use todor_formula::{FormulaHistory, FormulaRecord, ResolvedAsset};

use crate::artefact::download::ArtefactDownloader;
use crate::artefact::extraction::{ArtefactExtractor, locate_source};
use crate::artefact::verification::verify_archive;
use crate::error::Result;
use crate::layout::PrefixLayout;
use crate::output::{DryRunInfo, success_message, write_stderr_line};
use crate::placement::{apply, check_conflicts, ensure_writable, plan_placement};
use crate::receipt::{Receipt, ReceiptStore};

/// Directory inside the temporary workspace that receives extracted files.
const STAGING_DIRNAME: &str = "staged";

/// Parameters for one install run.
#[derive(Debug)]
pub struct InstallRequest<'a> {
    /// Records to choose from.
    pub history: &'a FormulaHistory,
    /// Version to install; the latest when `None`.
    pub version: Option<&'a Version>,
    /// Explicit target, bypassing host detection.
    pub target: Option<&'a TargetTriple>,
    /// Host used when no explicit target is given.
    pub host: HostPlatform,
    /// Destination prefix.
    pub layout: &'a PrefixLayout,
    /// Replace files the installer does not own.
    pub overwrite: bool,
    /// Stop after resolution without touching the network or the prefix.
    pub dry_run: bool,
    /// Suppress progress output.
    pub quiet: bool,
}

/// What an install run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Files were placed and a receipt was written.
    Installed {
        /// The receipt that now describes the install.
        receipt: Receipt,
        /// Files from the previous version that were removed.
        removed: Vec<Utf8PathBuf>,
    },
    /// Dry run: nothing was downloaded or written.
    DryRun {
        /// The download that would have been fetched.
        asset: ResolvedAsset,
        /// Files that would have been written.
        destinations: Vec<Utf8PathBuf>,
    },
}

/// Pick the target: the explicit override, else the host's mapping.
///
/// # Errors
///
/// Returns [`todor_formula::FormulaError::UnsupportedPlatform`] when the
/// host has no published archive.
pub fn resolve_target(
    explicit: Option<&TargetTriple>,
    host: &HostPlatform,
) -> Result<TargetTriple> {
    match explicit {
        Some(target) => Ok(target.clone()),
        None => Ok(host.target()?),
    }
}

/// Run an install.
///
/// # Errors
///
/// Returns an error when the record or platform cannot be resolved, the
/// download fails, the digest does not match, a mapped source is missing,
/// a destination conflicts, or a file cannot be written.
pub fn install(
    request: &InstallRequest<'_>,
    downloader: &dyn ArtefactDownloader,
    extractor: &dyn ArtefactExtractor,
    stderr: &mut dyn Write,
) -> Result<InstallOutcome> {
    let record = request.history.select(request.version)?;
    let target = resolve_target(request.target, &request.host)?;
    let asset = record.resolve(&target)?;
    log::debug!(target: "pipeline", "resolved {} -> {}", asset.archive_name, asset.url);

    if request.dry_run {
        return Ok(dry_run(request, record, asset, stderr));
    }

    ensure_writable(request.layout)?;
    let store = ReceiptStore::new(request.layout);
    let _lock = store.lock()?;
    let installed = store.list()?;
    let previous = installed.iter().find(|receipt| receipt.name == record.name());

    let temp_dir = tempfile::tempdir()?;
    let archive_path = temp_dir.path().join(&asset.archive_name);
    progress(request, stderr, format!("Downloading {}...", asset.url));
    downloader.download(&asset.url, &archive_path)?;

    progress(request, stderr, format!("Verifying {}...", asset.archive_name));
    verify_archive(&archive_path, &asset.sha256)?;

    let staged = temp_dir.path().join(STAGING_DIRNAME);
    std::fs::create_dir_all(&staged)?;
    let extracted = extractor.extract(&archive_path, &staged)?;
    log::debug!(target: "pipeline", "extracted {} files", extracted.len());

    let plan = plan_placement(request.layout, record, &staged, previous)?;
    check_conflicts(&plan, record, &installed, request.overwrite)?;
    progress(
        request,
        stderr,
        format!("Installing into {}...", request.layout.prefix()),
    );
    let applied = apply(&plan)?;

    let receipt = Receipt::new(
        record.name(),
        record.version().clone(),
        target,
        applied.entries,
    );
    store.save(&receipt)?;

    for path in &applied.removed {
        progress(request, stderr, format!("Removed stale {path}"));
    }
    progress(
        request,
        stderr,
        success_message(&asset, receipt.files.len(), request.layout.prefix()),
    );

    Ok(InstallOutcome::Installed {
        receipt,
        removed: applied.removed,
    })
}

fn dry_run(
    request: &InstallRequest<'_>,
    record: &FormulaRecord,
    asset: ResolvedAsset,
    stderr: &mut dyn Write,
) -> InstallOutcome {
    let destinations: Vec<Utf8PathBuf> = record
        .install()
        .iter()
        .map(|mapping| request.layout.destination(mapping))
        .collect();
    let info = DryRunInfo {
        asset: &asset,
        prefix: request.layout.prefix(),
        overwrite: request.overwrite,
        destinations: &destinations,
    };
    write_stderr_line(stderr, info.display_text());
    InstallOutcome::DryRun {
        asset,
        destinations,
    }
}

fn progress(request: &InstallRequest<'_>, stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if !request.quiet {
        write_stderr_line(stderr, message);
    }
}

/// Check one platform branch of `record` against its published archive.
///
/// Downloads the archive, compares its digest with the pinned one, and
/// confirms every mapped source exists inside it. Problems are returned as
/// findings rather than errors so an audit can report every branch.
pub fn check_record_online(
    record: &FormulaRecord,
    target: &TargetTriple,
    downloader: &dyn ArtefactDownloader,
    extractor: &dyn ArtefactExtractor,
) -> Vec<Finding> {
    let error = |check, message: String| {
        Finding::new(record, Some(target), Severity::Error, check, message)
    };

    let asset = match record.resolve(target) {
        Ok(asset) => asset,
        Err(err) => return vec![error(Check::PlatformCoverage, err.to_string())],
    };
    let temp_dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(err) => return vec![error(Check::ArchiveFetch, err.to_string())],
    };
    let archive_path = temp_dir.path().join(&asset.archive_name);
    if let Err(err) = downloader.download(&asset.url, &archive_path) {
        return vec![error(Check::ArchiveFetch, err.to_string())];
    }

    // An archive that fails its digest is never unpacked.
    match Sha256Digest::of_file(&archive_path) {
        Ok(actual) if actual == asset.sha256 => {}
        Ok(actual) => {
            return vec![error(
                Check::ArchiveDigest,
                format!(
                    "{} has digest {actual}, record pins {}",
                    asset.archive_name, asset.sha256
                ),
            )];
        }
        Err(err) => return vec![error(Check::ArchiveFetch, err.to_string())],
    }

    let staged = temp_dir.path().join(STAGING_DIRNAME);
    missing_entries(record, &archive_path, &staged, extractor)
        .into_iter()
        .map(|message| error(Check::ArchiveEntry, message))
        .collect()
}

fn missing_entries(
    record: &FormulaRecord,
    archive_path: &Path,
    staged: &Path,
    extractor: &dyn ArtefactExtractor,
) -> Vec<String> {
    if let Err(err) = std::fs::create_dir_all(staged) {
        return vec![err.to_string()];
    }
    if let Err(err) = extractor.extract(archive_path, staged) {
        return vec![format!("archive could not be extracted: {err}")];
    }
    record
        .install()
        .iter()
        .filter(|mapping| locate_source(staged, mapping.source()).is_none())
        .map(|mapping| format!("archive does not contain {}", mapping.source()))
        .collect()
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;

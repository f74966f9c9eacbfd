//! Placement of extracted files into the prefix.
//!
//! Placement runs in three steps. [`plan_placement`] resolves every install
//! mapping against the extracted archive and works out which files the
//! previous install left behind. [`check_conflicts`] refuses to touch files
//! the installer does not own. [`apply`] copies the files, sets their modes,
//! and removes stale files, undoing its own work if a copy fails.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use camino::{Utf8Path, Utf8PathBuf};
use todor_formula::FormulaRecord;
use todor_formula::digest::Sha256Digest;
use todor_formula::mapping::InstallLocation;

use crate::artefact::extraction::locate_source;
use crate::error::{InstallerError, Result};
use crate::layout::PrefixLayout;
use crate::receipt::{Receipt, ReceiptEntry};

/// Mode for executables placed in `bin`.
pub const EXECUTABLE_MODE: u32 = 0o755;

/// Mode for completion scripts.
pub const DATA_MODE: u32 = 0o644;

/// One file to copy into the prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    /// Extracted file inside the staging directory.
    pub source: PathBuf,
    /// Destination inside the prefix.
    pub destination: Utf8PathBuf,
    /// Directory kind the destination belongs to.
    pub location: InstallLocation,
}

impl PlannedFile {
    /// Permission bits the installed file receives on Unix.
    #[must_use]
    pub fn mode(&self) -> u32 {
        if self.location.is_executable() {
            EXECUTABLE_MODE
        } else {
            DATA_MODE
        }
    }
}

/// Everything an install will change in the prefix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlacementPlan {
    files: Vec<PlannedFile>,
    stale: Vec<Utf8PathBuf>,
}

impl PlacementPlan {
    /// Files to copy, in mapping order.
    #[must_use]
    pub fn files(&self) -> &[PlannedFile] {
        &self.files
    }

    /// Files from the previous install that the new one no longer ships.
    #[must_use]
    pub fn stale(&self) -> &[Utf8PathBuf] {
        &self.stale
    }
}

/// Result of a successful [`apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedPlacement {
    /// Receipt entries for every placed file.
    pub entries: Vec<ReceiptEntry>,
    /// Stale files that were removed.
    pub removed: Vec<Utf8PathBuf>,
}

/// Resolve every mapping of `record` against the extracted tree.
///
/// # Errors
///
/// Returns [`InstallerError::MissingArchiveEntry`] when a mapped source is
/// not in the archive.
pub fn plan_placement(
    layout: &PrefixLayout,
    record: &FormulaRecord,
    staged_root: &Path,
    previous: Option<&Receipt>,
) -> Result<PlacementPlan> {
    let files = record
        .install()
        .iter()
        .map(|mapping| {
            let source = locate_source(staged_root, mapping.source()).ok_or_else(|| {
                InstallerError::MissingArchiveEntry {
                    formula: format!("{} {}", record.name(), record.version()),
                    source_path: mapping.source().to_owned(),
                }
            })?;
            Ok(PlannedFile {
                source,
                destination: layout.destination(mapping),
                location: mapping.location(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let planned: BTreeSet<&Utf8Path> = files.iter().map(|f| f.destination.as_path()).collect();
    let stale = previous
        .map(|receipt| {
            receipt
                .files
                .iter()
                .filter(|entry| !planned.contains(entry.path.as_path()))
                .map(|entry| entry.path.clone())
                .collect()
        })
        .unwrap_or_default();

    Ok(PlacementPlan { files, stale })
}

/// Refuse plans that would clobber files the installer does not own.
///
/// `installed` holds the receipts currently present in the prefix. A
/// formula named in the record's `conflicts_with` (other than the record
/// itself) must not be installed. A destination that already exists must be
/// listed in the receipt of the same formula unless `overwrite` is set.
///
/// # Errors
///
/// Returns [`InstallerError::FormulaConflict`] or
/// [`InstallerError::ConflictingFile`].
pub fn check_conflicts(
    plan: &PlacementPlan,
    record: &FormulaRecord,
    installed: &[Receipt],
    overwrite: bool,
) -> Result<()> {
    if let Some(other) = installed.iter().find(|receipt| {
        receipt.name != record.name()
            && record.conflicts_with().iter().any(|name| *name == receipt.name)
    }) {
        return Err(InstallerError::FormulaConflict {
            name: record.name().to_owned(),
            other: other.name.clone(),
        });
    }

    let own = installed.iter().find(|receipt| receipt.name == record.name());
    for file in &plan.files {
        if !file.destination.exists() || own.is_some_and(|receipt| receipt.owns(&file.destination))
        {
            continue;
        }
        if overwrite {
            log::warn!(target: "placement", "overwriting {}", file.destination);
            continue;
        }
        return Err(InstallerError::ConflictingFile {
            path: file.destination.clone(),
        });
    }
    Ok(())
}

/// Copy the planned files into place and remove stale files.
///
/// Each file is written to a temporary sibling and renamed over the
/// destination. If any copy fails, files this call created are removed
/// before the error is returned.
///
/// # Errors
///
/// Returns [`InstallerError::PlacementFailed`] naming the destination that
/// could not be written.
pub fn apply(plan: &PlacementPlan) -> Result<AppliedPlacement> {
    let mut created: Vec<Utf8PathBuf> = Vec::new();
    let mut entries = Vec::with_capacity(plan.files.len());

    for file in &plan.files {
        let existed = file.destination.exists();
        match place_file(file) {
            Ok(sha256) => {
                if !existed {
                    created.push(file.destination.clone());
                }
                log::debug!(target: "placement", "installed {}", file.destination);
                entries.push(ReceiptEntry {
                    path: file.destination.clone(),
                    location: file.location,
                    sha256,
                });
            }
            Err(source) => {
                roll_back(&created);
                return Err(InstallerError::PlacementFailed {
                    path: file.destination.clone(),
                    source,
                });
            }
        }
    }

    let removed = plan
        .stale
        .iter()
        .filter(|path| remove_if_present(path))
        .cloned()
        .collect();

    Ok(AppliedPlacement { entries, removed })
}

fn place_file(file: &PlannedFile) -> std::io::Result<Sha256Digest> {
    let dir = file
        .destination
        .parent()
        .ok_or_else(|| std::io::Error::other("destination has no parent directory"))?;
    fs::create_dir_all(dir)?;

    let contents = fs::read(&file.source)?;
    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(&contents)?;
    staged.flush()?;
    set_mode(staged.path(), file.mode())?;
    staged
        .persist(file.destination.as_std_path())
        .map_err(|err| err.error)?;

    Ok(Sha256Digest::of_bytes(&contents))
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

fn roll_back(created: &[Utf8PathBuf]) {
    for path in created.iter().rev() {
        if let Err(err) = fs::remove_file(path) {
            log::warn!(target: "placement", "could not roll back {path}: {err}");
        } else {
            log::debug!(target: "placement", "rolled back {path}");
        }
    }
}

fn remove_if_present(path: &Utf8Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            log::debug!(target: "placement", "removed stale {path}");
            true
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => false,
        Err(err) => {
            log::warn!(target: "placement", "could not remove stale {path}: {err}");
            false
        }
    }
}

/// Probe that the prefix can be written before anything is downloaded.
///
/// # Errors
///
/// Returns [`InstallerError::PrefixNotWritable`] when the prefix cannot be
/// created or a probe file cannot be written into it.
pub fn ensure_writable(layout: &PrefixLayout) -> Result<()> {
    let prefix = layout.prefix();
    let not_writable = |err: std::io::Error| InstallerError::PrefixNotWritable {
        path: prefix.to_path_buf(),
        reason: err.to_string(),
    };
    fs::create_dir_all(prefix).map_err(not_writable)?;
    tempfile::NamedTempFile::new_in(prefix)
        .map(drop)
        .map_err(not_writable)
}

#[cfg(test)]
#[path = "placement_tests.rs"]
mod tests;

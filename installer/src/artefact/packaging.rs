//! Release packaging for todor binaries.
//!
//! Creates `todor-v<version>-<target>.tar.gz` archives holding the `todor`
//! executable at the archive root and its completion scripts under
//! `complete/`, then reports the digest a formula record must pin.

use super::packaging_error::PackagingError;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use todor_formula::digest::Sha256Digest;
use todor_formula::target::TargetTriple;
use todor_formula::url::archive_name;
use todor_formula::version::Version;

/// Directory inside the archive that holds completion scripts.
pub const COMPLETION_DIR: &str = "complete";

/// One file to place in a release archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    source: PathBuf,
    archive_path: String,
    mode: u32,
}

impl PackageEntry {
    /// The executable, stored at the archive root under its own file name.
    ///
    /// # Errors
    ///
    /// Returns [`PackagingError::InvalidInputPath`] if `path` has no file name.
    pub fn binary(path: impl Into<PathBuf>) -> Result<Self, PackagingError> {
        let source = path.into();
        let name = file_name(&source)?;
        Ok(Self {
            source,
            archive_path: name,
            mode: 0o755,
        })
    }

    /// A completion script, stored under `complete/`.
    ///
    /// # Errors
    ///
    /// Returns [`PackagingError::InvalidInputPath`] if `path` has no file name.
    pub fn completion(path: impl Into<PathBuf>) -> Result<Self, PackagingError> {
        let source = path.into();
        let name = file_name(&source)?;
        Ok(Self {
            source,
            archive_path: format!("{COMPLETION_DIR}/{name}"),
            mode: 0o644,
        })
    }

    /// Path inside the archive.
    #[must_use]
    pub fn archive_path(&self) -> &str {
        &self.archive_path
    }
}

/// Input parameters for the [`package_release`] function.
#[derive(Debug)]
pub struct PackageParams {
    /// Formula name used for the archive file name.
    pub name: String,
    /// Release version.
    pub version: Version,
    /// The target triple the binary was compiled for.
    pub target: TargetTriple,
    /// Files to include, in archive order.
    pub entries: Vec<PackageEntry>,
    /// Directory where the output archive will be written.
    pub output_dir: PathBuf,
}

/// Output produced by [`package_release`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOutput {
    /// Path to the created `.tar.gz` archive.
    pub archive_path: PathBuf,
    /// Digest of the archive, for the formula record's platform branch.
    pub sha256: Sha256Digest,
    /// Target the archive was built for.
    pub target: TargetTriple,
}

impl PackageOutput {
    /// The TOML platform table a formula record needs for this archive.
    #[must_use]
    pub fn platform_entry(&self) -> String {
        format!(
            "[platforms.{}]\nsha256 = \"{}\"\n",
            self.target, self.sha256
        )
    }
}

/// Create a `.tar.gz` archive at `output_path`.
///
/// Entry headers carry a zero mtime and fixed ownership so identical inputs
/// always produce identical archives.
///
/// # Errors
///
/// Returns [`PackagingError::Io`] if any source file cannot be read or
/// the output file cannot be written.
pub fn create_archive(output_path: &Path, entries: &[PackageEntry]) -> Result<(), PackagingError> {
    let output_file = fs::File::create(output_path)?;
    let encoder = GzEncoder::new(output_file, Compression::default());
    let mut archive = tar::Builder::new(encoder);

    for entry in entries {
        let contents = fs::read(&entry.source)?;
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(entry.mode);
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        archive.append_data(&mut header, &entry.archive_path, contents.as_slice())?;
    }

    let encoder = archive.into_inner()?;
    encoder.finish()?;
    Ok(())
}

/// Package a todor build into a release archive.
///
/// # Errors
///
/// Returns [`PackagingError::EmptyFileList`] if `params.entries` is empty,
/// [`PackagingError::DuplicateEntry`] if two inputs share an archive path,
/// or [`PackagingError::Io`] on I/O failures.
pub fn package_release(params: PackageParams) -> Result<PackageOutput, PackagingError> {
    if params.entries.is_empty() {
        return Err(PackagingError::EmptyFileList);
    }
    reject_duplicates(&params.entries)?;

    fs::create_dir_all(&params.output_dir)?;
    let archive_path = params
        .output_dir
        .join(archive_name(&params.name, &params.version, &params.target));

    create_archive(&archive_path, &params.entries)?;
    let sha256 = Sha256Digest::of_file(&archive_path)?;
    log::debug!(
        target: "packaging",
        "packaged {} entries into {} ({sha256})",
        params.entries.len(),
        archive_path.display()
    );

    Ok(PackageOutput {
        archive_path,
        sha256,
        target: params.target,
    })
}

fn reject_duplicates(entries: &[PackageEntry]) -> Result<(), PackagingError> {
    let mut seen = BTreeSet::new();
    for entry in entries {
        if !seen.insert(entry.archive_path.as_str()) {
            return Err(PackagingError::DuplicateEntry(entry.archive_path.clone()));
        }
    }
    Ok(())
}

fn file_name(path: &Path) -> Result<String, PackagingError> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| PackagingError::InvalidInputPath(path.to_path_buf()))
}

#[cfg(test)]
#[path = "packaging_tests.rs"]
mod tests;

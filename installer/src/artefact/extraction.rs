//! Archive extraction for todor release archives.
//!
//! Extracts `.tar.gz` archives to a staging directory with path traversal
//! protection to prevent zip-slip attacks, and locates mapped sources inside
//! the extracted tree.

use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;

/// Trait for extracting release archives, enabling test mocking.
///
/// # Examples
///
/// ```
/// use todor_installer::artefact::extraction::TarGzExtractor;
///
/// let extractor = TarGzExtractor;
/// // Use extractor.extract(archive_path, dest_dir) in production
/// # let _ = extractor;
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// Returns the archive-relative paths of the regular files that were
    /// extracted, using `/` as the separator.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry
    /// attempts to escape the destination directory.
    /// Returns [`ExtractionError::UnsupportedEntry`] for links and other
    /// entries that are neither regular files nor directories.
    /// Returns [`ExtractionError::EmptyArchive`] if no files are found.
    /// Returns [`ExtractionError::Io`] on I/O failures.
    fn extract(&self, archive_path: &Path, dest_dir: &Path)
    -> Result<Vec<String>, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// An entry is neither a regular file nor a directory.
    #[error("unsupported archive entry: {path}")]
    UnsupportedEntry {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no regular files.
    #[error("archive contains no files")]
    EmptyArchive,
}

/// Default extractor using the `tar` and `flate2` crates.
///
/// Validates each entry path before extraction to guard against
/// path traversal attacks (zip-slip). Symbolic links, hard links and
/// device entries are refused, so nothing is written outside `dest_dir`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarGzExtractor;

impl ArtefactExtractor for TarGzExtractor {
    fn extract(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
    ) -> Result<Vec<String>, ExtractionError> {
        let file = std::fs::File::open(archive_path)?;
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        archive.set_preserve_permissions(true);
        let mut extracted = Vec::new();

        for entry_result in archive.entries()? {
            let mut entry = entry_result?;
            let entry_path = entry.path()?.into_owned();

            validate_entry_path(&entry_path)?;

            let entry_type = entry.header().entry_type();
            let is_file = entry_type.is_file();
            if !is_file && !entry_type.is_dir() {
                return Err(ExtractionError::UnsupportedEntry {
                    path: entry_path.display().to_string(),
                });
            }

            if !entry.unpack_in(dest_dir)? {
                return Err(ExtractionError::PathTraversal {
                    path: entry_path.display().to_string(),
                });
            }

            if is_file {
                log::trace!(target: "extraction", "extracted {}", entry_path.display());
                extracted.push(relative_name(&entry_path));
            }
        }

        if extracted.is_empty() {
            return Err(ExtractionError::EmptyArchive);
        }

        Ok(extracted)
    }
}

/// Validate that a tar entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    if path.is_absolute() {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    for component in path.components() {
        if matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        ) {
            return Err(ExtractionError::PathTraversal {
                path: path.display().to_string(),
            });
        }
    }
    Ok(())
}

/// Render an entry path with `/` separators and without `.` components.
fn relative_name(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Locate a mapping source inside an extracted archive tree.
///
/// The source is looked up relative to `root` first. Release archives are
/// sometimes wrapped in a single top-level directory; when the source is
/// absent at the root and `root` holds exactly one directory and nothing
/// else, the lookup is repeated inside that directory.
///
/// Returns `None` when the source is not a regular file in either place.
///
/// # Examples
///
/// ```
/// use todor_installer::artefact::extraction::locate_source;
///
/// let dir = tempfile::tempdir()?;
/// std::fs::create_dir_all(dir.path().join("todor-v0.6.0/complete"))?;
/// std::fs::write(dir.path().join("todor-v0.6.0/complete/_todor"), "#compdef todor")?;
///
/// let found = locate_source(dir.path(), "complete/_todor");
/// assert_eq!(found, Some(dir.path().join("todor-v0.6.0/complete/_todor")));
/// # Ok::<(), std::io::Error>(())
/// ```
#[must_use]
pub fn locate_source(root: &Path, source: &str) -> Option<PathBuf> {
    let direct = root.join(source);
    if direct.is_file() {
        return Some(direct);
    }

    let nested = single_top_level_dir(root)?.join(source);
    nested.is_file().then_some(nested)
}

fn single_top_level_dir(root: &Path) -> Option<PathBuf> {
    let mut entries = std::fs::read_dir(root).ok()?;
    let only = entries.next()?.ok()?;
    if entries.next().is_some() {
        return None;
    }
    let path = only.path();
    path.is_dir().then_some(path)
}

//! Install receipts.
//!
//! A receipt records which files an install placed into a prefix so that a
//! later upgrade can tell its own files from foreign ones, and so that
//! uninstall knows what to remove. Receipts are stored as pretty-printed
//! JSON at `<prefix>/var/todor-tap/receipts/<name>.json`.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use camino::{Utf8Path, Utf8PathBuf};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use todor_formula::digest::Sha256Digest;
use todor_formula::mapping::InstallLocation;
use todor_formula::target::TargetTriple;
use todor_formula::version::Version;

use crate::layout::PrefixLayout;

const RECEIPT_EXTENSION: &str = "json";

/// One file placed by an install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptEntry {
    /// Absolute path of the installed file.
    pub path: Utf8PathBuf,
    /// Directory kind the file was installed into.
    pub location: InstallLocation,
    /// Digest of the installed contents.
    pub sha256: Sha256Digest,
}

/// Record of one installed formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Formula name.
    pub name: String,
    /// Installed version.
    pub version: Version,
    /// Target triple of the installed archive.
    pub target: TargetTriple,
    /// Seconds since the Unix epoch when the install finished.
    pub installed_at: u64,
    /// Files placed by the install, in mapping order.
    pub files: Vec<ReceiptEntry>,
}

impl Receipt {
    /// Build a receipt stamped with the current time.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        version: Version,
        target: TargetTriple,
        files: Vec<ReceiptEntry>,
    ) -> Self {
        let installed_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        Self {
            name: name.into(),
            version,
            target,
            installed_at,
            files,
        }
    }

    /// Whether this receipt lists `path`.
    #[must_use]
    pub fn owns(&self, path: &Utf8Path) -> bool {
        self.files.iter().any(|entry| entry.path == path)
    }
}

/// Errors that prevent receipt persistence.
#[derive(Debug, thiserror::Error)]
pub enum ReceiptError {
    /// Creating the receipts directory failed.
    #[error("failed to create receipts directory {path}: {source}")]
    CreateDirectory {
        /// Directory path that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading a receipt failed.
    #[error("failed to read receipt {path}: {source}")]
    Read {
        /// File path that could not be read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A receipt is not valid JSON for the receipt schema.
    #[error("receipt {path} is corrupt: {source}")]
    Parse {
        /// File path that could not be parsed.
        path: Utf8PathBuf,
        /// Underlying deserialisation error.
        #[source]
        source: serde_json::Error,
    },

    /// Serializing a receipt failed.
    #[error("failed to serialize receipt: {source}")]
    Serialize {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Writing a receipt failed.
    #[error("failed to write receipt {path}: {source}")]
    Write {
        /// File path that could not be written.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Deleting a receipt failed.
    #[error("failed to remove receipt {path}: {source}")]
    Remove {
        /// File path that could not be removed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The prefix lock could not be taken.
    #[error("failed to lock {path}: {source}")]
    Lock {
        /// Lock file path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Exclusive advisory lock on a prefix, released on drop.
#[derive(Debug)]
pub struct InstallLock {
    file: File,
    path: Utf8PathBuf,
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            log::debug!(target: "receipt", "failed to unlock {}: {err}", self.path);
        }
    }
}

/// Receipt storage for one prefix.
#[derive(Debug, Clone)]
pub struct ReceiptStore {
    dir: Utf8PathBuf,
    lock_path: Utf8PathBuf,
}

impl ReceiptStore {
    /// Store rooted at the receipts directory of `layout`.
    #[must_use]
    pub fn new(layout: &PrefixLayout) -> Self {
        Self {
            dir: layout.receipts_dir(),
            lock_path: layout.lock_path(),
        }
    }

    /// Path of the receipt for `name`.
    #[must_use]
    pub fn path_for(&self, name: &str) -> Utf8PathBuf {
        self.dir.join(format!("{name}.{RECEIPT_EXTENSION}"))
    }

    /// Load the receipt for `name`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptError::Read`] or [`ReceiptError::Parse`] when the
    /// receipt exists but cannot be loaded.
    pub fn load(&self, name: &str) -> Result<Option<Receipt>, ReceiptError> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(None);
        }
        read_receipt(&path).map(Some)
    }

    /// Persist `receipt`, replacing any previous receipt for the same name.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created or the file
    /// cannot be written. The receipt is written to a temporary file in the
    /// same directory and renamed into place, so readers never observe a
    /// partially written receipt.
    pub fn save(&self, receipt: &Receipt) -> Result<Utf8PathBuf, ReceiptError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| ReceiptError::CreateDirectory {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(&receipt.name);
        let json = serde_json::to_string_pretty(receipt)
            .map_err(|source| ReceiptError::Serialize { source })?;
        let write_error = |source| ReceiptError::Write {
            path: path.clone(),
            source,
        };
        let mut staged = tempfile::NamedTempFile::new_in(&self.dir).map_err(write_error)?;
        staged.write_all(json.as_bytes()).map_err(write_error)?;
        staged
            .persist(&path)
            .map_err(|err| write_error(err.error))?;
        log::debug!(target: "receipt", "wrote {path}");
        Ok(path)
    }

    /// Delete the receipt for `name`. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptError::Remove`] when the file exists but cannot be
    /// deleted.
    pub fn remove(&self, name: &str) -> Result<bool, ReceiptError> {
        let path = self.path_for(name);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(ReceiptError::Remove { path, source }),
        }
    }

    /// Every readable receipt, sorted by name.
    ///
    /// Receipts that cannot be read or parsed are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptError::Read`] when the receipts directory exists
    /// but cannot be listed.
    pub fn list(&self) -> Result<Vec<Receipt>, ReceiptError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(ReceiptError::Read {
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let mut receipts: Vec<Receipt> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter_map(receipt_path)
            .filter_map(|path| match read_receipt(&path) {
                Ok(receipt) => Some(receipt),
                Err(err) => {
                    log::warn!(target: "receipt", "skipping {path}: {err}");
                    None
                }
            })
            .collect();
        receipts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(receipts)
    }

    /// Take the exclusive prefix lock, blocking until it is free.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptError::Lock`] when the lock file cannot be created
    /// or locked.
    pub fn lock(&self) -> Result<InstallLock, ReceiptError> {
        let lock_error = |source| ReceiptError::Lock {
            path: self.lock_path.clone(),
            source,
        };
        if let Some(parent) = self.lock_path.parent() {
            std::fs::create_dir_all(parent).map_err(lock_error)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)
            .map_err(lock_error)?;
        log::trace!(target: "receipt", "waiting for {}", self.lock_path);
        file.lock_exclusive().map_err(lock_error)?;
        Ok(InstallLock {
            file,
            path: self.lock_path.clone(),
        })
    }
}

fn receipt_path(path: PathBuf) -> Option<Utf8PathBuf> {
    let path = Utf8PathBuf::from_path_buf(path).ok()?;
    (path.extension() == Some(RECEIPT_EXTENSION)).then_some(path)
}

fn read_receipt(path: &Utf8Path) -> Result<Receipt, ReceiptError> {
    let content = std::fs::read_to_string(path).map_err(|source| ReceiptError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ReceiptError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

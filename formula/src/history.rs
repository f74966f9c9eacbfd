//! Immutable release history for one formula.
//!
//! Records are keyed by version. Re-adding an identical record is a no-op so
//! that bundled and user-supplied directories may overlap; a record that
//! differs from the published one for the same version is refused.

use crate::error::{FormulaError, Result};
use crate::record::FormulaRecord;
use crate::version::Version;
use log::debug;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Record files shipped with this crate, oldest first.
const BUNDLED_RECORDS: &[(&str, &str)] = &[
    ("todor-0.5.1.toml", include_str!("../records/todor-0.5.1.toml")),
    ("todor-0.6.0.toml", include_str!("../records/todor-0.6.0.toml")),
];

/// Every published record of a single formula, ordered by version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormulaHistory {
    records: BTreeMap<Version, FormulaRecord>,
}

impl FormulaHistory {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the records bundled with this crate.
    ///
    /// # Errors
    ///
    /// Returns an error only if a bundled record fails to parse, which the
    /// crate's own tests rule out.
    pub fn bundled() -> Result<Self> {
        let mut history = Self::new();
        for (file_name, source) in BUNDLED_RECORDS {
            let record = FormulaRecord::from_toml_str(source).map_err(|e| match e {
                FormulaError::Parse { reason, .. } => FormulaError::Parse {
                    origin: format!(" from bundled {file_name}"),
                    reason,
                },
                other => other,
            })?;
            history.insert(record)?;
        }
        Ok(history)
    }

    /// Load the bundled records plus every `*.toml` file in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read, a file is not a
    /// valid record, or a file redefines a published version.
    pub fn bundled_with_dir(dir: Option<&Path>) -> Result<Self> {
        let mut history = Self::bundled()?;
        if let Some(path) = dir {
            history.extend_from_dir(path)?;
        }
        Ok(history)
    }

    /// Load only the records found in `dir`.
    ///
    /// # Errors
    ///
    /// See [`Self::extend_from_dir`].
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut history = Self::new();
        history.extend_from_dir(dir)?;
        Ok(history)
    }

    /// Add every `*.toml` record in `dir`, in file-name order.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::ReadRecords`] when the directory cannot be
    /// listed and any error from [`FormulaRecord::from_path`] or
    /// [`Self::insert`].
    pub fn extend_from_dir(&mut self, dir: &Path) -> Result<()> {
        for path in record_files(dir)? {
            debug!("loading formula record from {}", path.display());
            let record = FormulaRecord::from_path(&path)?;
            self.insert(record)?;
        }
        Ok(())
    }

    /// Add a record.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::MixedFormulae`] when the record belongs to a
    /// different formula and [`FormulaError::RecordMutated`] when a different
    /// record for the same version is already present.
    pub fn insert(&mut self, record: FormulaRecord) -> Result<()> {
        if let Some(expected) = self.name().filter(|name| *name != record.name()) {
            return Err(FormulaError::MixedFormulae {
                expected: expected.to_owned(),
                found: record.name().to_owned(),
            });
        }

        match self.records.get(record.version()) {
            Some(existing) if *existing == record => {
                debug!(
                    "formula {} {} already loaded; skipping identical record",
                    record.name(),
                    record.version()
                );
                Ok(())
            }
            Some(_) => Err(FormulaError::RecordMutated {
                name: record.name().to_owned(),
                version: record.version().to_string(),
            }),
            None => {
                self.records.insert(record.version().clone(), record);
                Ok(())
            }
        }
    }

    /// Formula name shared by every record, if any are loaded.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.records.values().next().map(FormulaRecord::name)
    }

    /// The record with the highest version.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::EmptyHistory`] if no record is loaded.
    pub fn latest(&self) -> Result<&FormulaRecord> {
        self.records
            .values()
            .next_back()
            .ok_or(FormulaError::EmptyHistory)
    }

    /// The record for exactly `version`.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::UnknownVersion`] if that version was never
    /// published.
    pub fn get(&self, version: &Version) -> Result<&FormulaRecord> {
        self.records
            .get(version)
            .ok_or_else(|| FormulaError::UnknownVersion {
                version: version.to_string(),
            })
    }

    /// Pick `version` when given, otherwise the latest record.
    ///
    /// # Errors
    ///
    /// See [`Self::get`] and [`Self::latest`].
    pub fn select(&self, version: Option<&Version>) -> Result<&FormulaRecord> {
        match version {
            Some(wanted) => self.get(wanted),
            None => self.latest(),
        }
    }

    /// Records in ascending version order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &FormulaRecord> + '_ {
        self.records.values()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn record_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_error = |e: std::io::Error| FormulaError::ReadRecords {
        path: dir.display().to_string(),
        reason: e.to_string(),
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

//! Removal of installed formulae.
//!
//! Uninstalling deletes exactly the files the formula's receipt lists and
//! then the receipt itself. Files the receipt does not list are never
//! touched, so completions or binaries placed by other tools survive.

use std::io::ErrorKind;

use camino::Utf8PathBuf;

use crate::error::{InstallerError, Result};
use crate::layout::PrefixLayout;
use crate::receipt::ReceiptStore;

/// Remove the formula `name` from `layout`.
///
/// Returns the paths that were deleted. Receipt entries whose file is
/// already gone are skipped.
///
/// # Errors
///
/// Returns [`InstallerError::NotInstalled`] when no receipt exists for
/// `name`, or an error when a listed file or the receipt cannot be removed.
pub fn uninstall(layout: &PrefixLayout, name: &str) -> Result<Vec<Utf8PathBuf>> {
    let store = ReceiptStore::new(layout);
    let _lock = store.lock()?;
    let receipt = store
        .load(name)?
        .ok_or_else(|| InstallerError::NotInstalled {
            name: name.to_owned(),
            prefix: layout.prefix().to_path_buf(),
        })?;

    let mut removed = Vec::with_capacity(receipt.files.len());
    for entry in &receipt.files {
        match std::fs::remove_file(&entry.path) {
            Ok(()) => removed.push(entry.path.clone()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::debug!(target: "uninstall", "{} already absent", entry.path);
            }
            Err(source) => {
                return Err(InstallerError::PlacementFailed {
                    path: entry.path.clone(),
                    source,
                });
            }
        }
    }

    store.remove(name)?;
    log::debug!(
        target: "uninstall",
        "removed {name} {} ({} files)",
        receipt.version,
        removed.len()
    );
    Ok(removed)
}

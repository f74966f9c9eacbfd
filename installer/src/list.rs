//! List command implementation.
//!
//! Reads the receipts of a prefix and writes them to stdout, human-readable
//! by default or JSON with `--json`.

use std::io::Write;

use crate::error::{InstallerError, Result};
use crate::layout::PrefixLayout;
use crate::list_output::{format_human, format_json};
use crate::receipt::ReceiptStore;

/// Lists the formulae installed into `layout`.
///
/// # Errors
///
/// Returns an error if the receipts directory cannot be read or writing to
/// stdout fails.
pub fn run_list(layout: &PrefixLayout, json: bool, stdout: &mut dyn Write) -> Result<()> {
    let receipts = ReceiptStore::new(layout).list()?;
    log::trace!(target: "list", "found {} receipts in {}", receipts.len(), layout.prefix());

    let output = if json {
        format_json(&receipts, layout.prefix())
    } else {
        format_human(&receipts, layout.prefix())
    };

    writeln!(stdout, "{output}").map_err(|e| InstallerError::WriteFailed { source: e })?;
    Ok(())
}

//! Output formatting for the installer CLI.
//!
//! Progress and result lines go to stderr so that stdout stays free for
//! machine-readable output such as `list --json` and `render`.

use camino::{Utf8Path, Utf8PathBuf};
use std::io::Write;
use todor_formula::ResolvedAsset;

/// Write a line to stderr, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Format a success message after installation.
#[must_use]
pub fn success_message(asset: &ResolvedAsset, count: usize, prefix: &Utf8Path) -> String {
    let plural = if count == 1 { "file" } else { "files" };
    format!(
        "Installed {} {} ({count} {plural}) into {prefix}",
        asset.name, asset.version
    )
}

/// Information shown by `install --dry-run`.
///
/// # Example
///
/// ```
/// use camino::{Utf8Path, Utf8PathBuf};
/// use todor_formula::FormulaHistory;
/// use todor_formula::target::TargetTriple;
/// use todor_installer::output::DryRunInfo;
///
/// let history = FormulaHistory::bundled()?;
/// let target = TargetTriple::try_from("x86_64-unknown-linux-gnu")?;
/// let asset = history.latest()?.resolve(&target)?;
/// let destinations = vec![Utf8PathBuf::from("/usr/local/bin/todor")];
///
/// let info = DryRunInfo {
///     asset: &asset,
///     prefix: Utf8Path::new("/usr/local"),
///     overwrite: false,
///     destinations: &destinations,
/// };
///
/// let output = info.display_text();
/// assert!(output.contains("Dry run"));
/// assert!(output.contains("/usr/local/bin/todor"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct DryRunInfo<'a> {
    /// The resolved download.
    pub asset: &'a ResolvedAsset,
    /// Installation prefix.
    pub prefix: &'a Utf8Path,
    /// Whether foreign files would be replaced.
    pub overwrite: bool,
    /// Files the install would write.
    pub destinations: &'a [Utf8PathBuf],
}

impl DryRunInfo<'_> {
    /// Format the dry-run information for display.
    #[must_use]
    pub fn display_text(&self) -> String {
        let mut lines = vec![
            "Dry run - no files will be downloaded or modified".to_owned(),
            String::new(),
            format!("Formula: {} {}", self.asset.name, self.asset.version),
            format!("Target: {}", self.asset.target),
            format!("URL: {}", self.asset.url),
            format!("SHA-256: {}", self.asset.sha256),
            format!("Prefix: {}", self.prefix),
            format!("Overwrite: {}", self.overwrite),
            String::new(),
            "Files to install:".to_owned(),
        ];
        lines.extend(self.destinations.iter().map(|path| format!("  - {path}")));
        lines.join("\n")
    }
}

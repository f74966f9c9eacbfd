//! Output formatting for installed-formula listing.
//!
//! This module formats install receipts for human-readable or JSON output.

use camino::Utf8Path;
use serde::Serialize;

use crate::receipt::Receipt;

/// Format receipts for human-readable output.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use todor_installer::list_output::format_human;
///
/// let output = format_human(&[], Utf8Path::new("/usr/local"));
/// assert!(output.contains("Nothing installed"));
/// ```
#[must_use]
pub fn format_human(receipts: &[Receipt], prefix: &Utf8Path) -> String {
    if receipts.is_empty() {
        return format!(
            "Nothing installed in {prefix}.\n\nRun `todor-installer install` to install todor."
        );
    }

    let mut output = format!("Installed in {prefix}:\n");
    for receipt in receipts {
        output.push('\n');
        output.push_str(&format!(
            "{} {} ({})\n",
            receipt.name, receipt.version, receipt.target
        ));
        for entry in &receipt.files {
            output.push_str(&format!("  - {} [{}]\n", entry.path, entry.location));
        }
    }
    output
}

/// Format receipts as JSON.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use todor_installer::list_output::format_json;
///
/// let json = format_json(&[], Utf8Path::new("/usr/local"));
/// assert!(json.contains("\"installed\""));
/// ```
#[must_use]
pub fn format_json(receipts: &[Receipt], prefix: &Utf8Path) -> String {
    let json_data = InstalledJson {
        prefix: prefix.as_str(),
        installed: receipts,
    };
    serde_json::to_string_pretty(&json_data).unwrap_or_else(|_| "{}".to_owned())
}

/// JSON-serializable listing of a prefix.
#[derive(Debug, Serialize)]
struct InstalledJson<'a> {
    prefix: &'a str,
    installed: &'a [Receipt],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receipt::ReceiptEntry;
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use todor_formula::digest::Sha256Digest;
    use todor_formula::mapping::InstallLocation;
    use todor_formula::target::TargetTriple;
    use todor_formula::version::Version;

    #[fixture]
    fn receipts() -> Vec<Receipt> {
        vec![Receipt {
            name: "todor".to_owned(),
            version: Version::try_from("0.6.0").expect("version"),
            target: TargetTriple::try_from("x86_64-apple-darwin").expect("target"),
            installed_at: 1_700_000_000,
            files: vec![
                ReceiptEntry {
                    path: Utf8PathBuf::from("/usr/local/bin/todor"),
                    location: InstallLocation::Bin,
                    sha256: Sha256Digest::of_bytes(b"todor"),
                },
                ReceiptEntry {
                    path: Utf8PathBuf::from("/usr/local/share/zsh/site-functions/_todor"),
                    location: InstallLocation::ZshCompletion,
                    sha256: Sha256Digest::of_bytes(b"#compdef todor"),
                },
            ],
        }]
    }

    #[rstest]
    fn human_output_lists_files(receipts: Vec<Receipt>) {
        let output = format_human(&receipts, Utf8Path::new("/usr/local"));
        assert!(output.starts_with("Installed in /usr/local:"));
        assert!(output.contains("todor 0.6.0 (x86_64-apple-darwin)"));
        assert!(output.contains("  - /usr/local/bin/todor [bin]"));
        assert!(output.contains("[zsh-completion]"));
    }

    #[test]
    fn human_output_for_empty_prefix() {
        let output = format_human(&[], Utf8Path::new("/opt/todor"));
        assert!(output.contains("Nothing installed in /opt/todor"));
    }

    #[rstest]
    fn json_output_is_structured(receipts: Vec<Receipt>) {
        let json = format_json(&receipts, Utf8Path::new("/usr/local"));
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");

        assert_eq!(parsed["prefix"], "/usr/local");
        assert_eq!(parsed["installed"][0]["name"], "todor");
        assert_eq!(parsed["installed"][0]["version"], "0.6.0");
        assert_eq!(parsed["installed"][0]["files"][1]["location"], "zsh-completion");
    }
}

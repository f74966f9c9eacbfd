//! Homebrew formula rendering.
//!
//! Emits the Ruby formula that a tap would publish for a record, using the
//! same `if OS.mac?` / `elsif OS.linux?` branch layout as the hand-written
//! revisions.

use crate::mapping::{InstallLocation, InstallMapping};
use crate::record::FormulaRecord;
use crate::target::{TargetOs, TargetTriple};
use crate::url::{TARGET_PLACEHOLDER, VERSION_PLACEHOLDER};

/// Render `record` as a Homebrew Ruby formula.
///
/// # Examples
///
/// ```
/// use todor_formula::history::FormulaHistory;
/// use todor_formula::render::render_ruby;
///
/// let history = FormulaHistory::bundled().expect("bundled records");
/// let ruby = render_ruby(history.latest().expect("non-empty"));
/// assert!(ruby.starts_with("class Todor < Formula\n"));
/// assert!(ruby.contains("zsh_completion.install \"complete/_todor\""));
/// ```
#[must_use]
pub fn render_ruby(record: &FormulaRecord) -> String {
    let mut formula = format!(
        "class {} < Formula\n  version '{}'\n  desc \"{}\"\n  homepage \"{}\"\n",
        record.class_name(),
        record.version(),
        escape(record.desc()),
        escape(record.homepage()),
    );

    formula.push_str(&render_branches(record));

    if !record.conflicts_with().is_empty() {
        formula.push('\n');
        for other in record.conflicts_with() {
            formula.push_str(&format!("  conflicts_with \"{}\"\n", escape(other)));
        }
    }

    formula.push_str("\n  def install\n");
    formula.push_str(&render_install(record));
    formula.push_str("  end\nend\n");
    formula
}

fn render_branches(record: &FormulaRecord) -> String {
    let mut branches = String::new();
    let ordered = [TargetOs::MacOs, TargetOs::Linux];
    let mut keyword = "if";
    for os in ordered {
        let Some((target, asset)) = record
            .platforms()
            .iter()
            .find(|(target, _)| target.os() == os)
        else {
            continue;
        };
        let condition = match os {
            TargetOs::MacOs => "OS.mac?",
            TargetOs::Linux => "OS.linux?",
        };
        branches.push_str(&format!(
            "  {keyword} {condition}\n    url \"{}\"\n    sha256 \"{}\"\n",
            ruby_url(record, target),
            asset.sha256
        ));
        keyword = "elsif";
    }
    if branches.is_empty() {
        return branches;
    }
    format!("\n{branches}  end\n")
}

/// Translate the template into Ruby, keeping version interpolation visible.
fn ruby_url(record: &FormulaRecord, target: &TargetTriple) -> String {
    escape(record.url_for(target).as_str())
        .replace(VERSION_PLACEHOLDER, "#{version}")
        .replace(TARGET_PLACEHOLDER, target.as_str())
}

fn render_install(record: &FormulaRecord) -> String {
    let mut groups = Vec::new();
    for location in InstallLocation::ALL {
        let lines: Vec<String> = record
            .mappings_for(location)
            .map(|mapping| install_line(location, mapping))
            .collect();
        if !lines.is_empty() {
            groups.push(lines.concat());
        }
    }
    groups.join("\n")
}

fn install_line(location: InstallLocation, mapping: &InstallMapping) -> String {
    let receiver = match location {
        InstallLocation::Bin => "bin",
        InstallLocation::BashCompletion => "bash_completion",
        InstallLocation::FishCompletion => "fish_completion",
        InstallLocation::ZshCompletion => "zsh_completion",
    };
    match mapping.rename() {
        Some(name) => format!(
            "    {receiver}.install \"{}\" => \"{}\"\n",
            escape(mapping.source()),
            escape(name)
        ),
        None => format!("    {receiver}.install \"{}\"\n", escape(mapping.source())),
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

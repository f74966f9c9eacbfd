//! CLI argument definitions for the todor installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use todor_formula::FormulaError;
use todor_formula::target::TargetTriple;
use todor_formula::version::Version;

/// Install verified todor release archives.
#[derive(Parser, Debug)]
#[command(name = "todor-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Install verified todor release archives.\n\n",
    "Each todor release is described by a formula record that pins the download ",
    "URL and SHA-256 digest of a prebuilt archive per platform. The installer ",
    "downloads the archive for this host, refuses to continue if the digest does ",
    "not match, and places the binary and its bash, fish and zsh completions into ",
    "a prefix.\n\n",
    "The prefix defaults to ~/.local and can be set with --prefix, the ",
    "TODOR_TAP_PREFIX environment variable, or the installer's config.toml.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Install the latest todor into ~/.local:\n",
    "    $ todor-installer install\n\n",
    "  Install a specific version into /usr/local:\n",
    "    $ todor-installer install --version 0.6.0 --prefix /usr/local\n\n",
    "  Preview without downloading:\n",
    "    $ todor-installer install --dry-run\n\n",
    "  Check every record against its published archives:\n",
    "    $ todor-installer audit --online\n\n",
    "For more information, see: https://github.com/lavifb/todo_r",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Increase diagnostic output (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download, verify, and install a release.
    Install(InstallArgs),

    /// Remove an installed formula.
    Uninstall(UninstallArgs),

    /// List installed formulae.
    List(ListArgs),

    /// Check formula records for consistency.
    Audit(AuditArgs),

    /// Print a record as a Homebrew formula.
    Render(RenderArgs),

    /// Build a release archive and print its platform entry.
    Package(PackageArgs),

    /// Print shell completions for this tool.
    Completions(CompletionsArgs),
}

/// Arguments for the install command.
#[derive(Parser, Debug, Clone, Default)]
pub struct InstallArgs {
    /// Version to install [default: latest].
    #[arg(long, value_name = "VERSION", value_parser = parse_version)]
    pub version: Option<Version>,

    /// Install the archive for this target instead of the host's.
    #[arg(long, value_name = "TRIPLE", value_parser = parse_target)]
    pub target: Option<TargetTriple>,

    /// Installation prefix [default: ~/.local].
    #[arg(long, value_name = "DIR")]
    pub prefix: Option<Utf8PathBuf>,

    /// Load additional formula records from this directory.
    #[arg(long, value_name = "DIR")]
    pub formula_dir: Option<Utf8PathBuf>,

    /// Replace existing files that the installer did not place.
    #[arg(long)]
    pub overwrite: bool,

    /// Show what would be installed and exit without downloading.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the uninstall command.
#[derive(Parser, Debug, Clone)]
pub struct UninstallArgs {
    /// Formula to remove.
    #[arg(value_name = "NAME", default_value = "todor")]
    pub name: String,

    /// Installation prefix [default: ~/.local].
    #[arg(long, value_name = "DIR")]
    pub prefix: Option<Utf8PathBuf>,
}

/// Arguments for the list command.
#[derive(Parser, Debug, Clone, Default)]
pub struct ListArgs {
    /// Output in JSON format for scripting.
    #[arg(long)]
    pub json: bool,

    /// Installation prefix [default: ~/.local].
    #[arg(long, value_name = "DIR")]
    pub prefix: Option<Utf8PathBuf>,
}

/// Arguments for the audit command.
#[derive(Parser, Debug, Clone, Default)]
pub struct AuditArgs {
    /// Load additional formula records from this directory.
    #[arg(long, value_name = "DIR")]
    pub formula_dir: Option<Utf8PathBuf>,

    /// Also download every archive and check its digest and contents.
    #[arg(long)]
    pub online: bool,

    /// Limit online checks to one target.
    #[arg(long, value_name = "TRIPLE", value_parser = parse_target, requires = "online")]
    pub target: Option<TargetTriple>,
}

/// Arguments for the render command.
#[derive(Parser, Debug, Clone, Default)]
pub struct RenderArgs {
    /// Version to render [default: latest].
    #[arg(long, value_name = "VERSION", value_parser = parse_version)]
    pub version: Option<Version>,

    /// Load additional formula records from this directory.
    #[arg(long, value_name = "DIR")]
    pub formula_dir: Option<Utf8PathBuf>,
}

/// Arguments for the package command.
#[derive(Parser, Debug, Clone)]
pub struct PackageArgs {
    /// Formula name used in the archive file name.
    #[arg(long, value_name = "NAME", default_value = "todor")]
    pub name: String,

    /// Release version.
    #[arg(long, value_name = "VERSION", value_parser = parse_version)]
    pub version: Version,

    /// Target the binary was compiled for.
    #[arg(long, value_name = "TRIPLE", value_parser = parse_target)]
    pub target: TargetTriple,

    /// Compiled `todor` executable.
    #[arg(long, value_name = "PATH")]
    pub binary: Utf8PathBuf,

    /// Completion script to ship under `complete/` (can be repeated).
    #[arg(long, value_name = "PATH")]
    pub completion: Vec<Utf8PathBuf>,

    /// Directory to write the archive into.
    #[arg(long, value_name = "DIR")]
    pub output: Utf8PathBuf,
}

/// Arguments for the completions command.
#[derive(Parser, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: Shell,
}

fn parse_version(value: &str) -> Result<Version, FormulaError> {
    Version::try_from(value)
}

fn parse_target(value: &str) -> Result<TargetTriple, FormulaError> {
    TargetTriple::try_from(value)
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;

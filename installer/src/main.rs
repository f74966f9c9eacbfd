//! todor installer CLI entrypoint.
//!
//! This binary installs verified todor release archives into a prefix,
//! removes and lists them, and carries the maintainer tooling for formula
//! records: audit, render, and package.

use camino::Utf8Path;
use clap::{CommandFactory, Parser};
use std::io::Write;
use todor_formula::FormulaHistory;
use todor_formula::render::render_ruby;
use todor_formula::target::HostPlatform;
use todor_installer::artefact::download::HttpDownloader;
use todor_installer::artefact::extraction::TarGzExtractor;
use todor_installer::artefact::packaging::{PackageEntry, PackageParams, package_release};
use todor_installer::audit::{OnlineAudit, run_audit};
use todor_installer::cli::{
    AuditArgs, Cli, Command, InstallArgs, PackageArgs, RenderArgs, UninstallArgs,
};
use todor_installer::config::InstallerConfig;
use todor_installer::dirs::{BaseDirs, NoBaseDirs, SystemBaseDirs};
use todor_installer::error::{InstallerError, Result};
use todor_installer::layout::PrefixLayout;
use todor_installer::list::run_list;
use todor_installer::output::write_stderr_line;
use todor_installer::pipeline::{InstallRequest, install};
use todor_installer::uninstall::uninstall;

/// Settings shared by every subcommand.
struct RunContext<'a> {
    cli: &'a Cli,
    config: &'a InstallerConfig,
    dirs: &'a dyn BaseDirs,
}

fn main() {
    let cli = Cli::parse();
    todor_installer::logging::init(cli.verbosity, cli.quiet);

    let system_dirs = SystemBaseDirs::new();
    let dirs: &dyn BaseDirs = match &system_dirs {
        Some(dirs) => dirs,
        None => &NoBaseDirs,
    };
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, dirs, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(
    cli: &Cli,
    dirs: &dyn BaseDirs,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<()> {
    let config = InstallerConfig::load(dirs)?;
    let context = RunContext {
        cli,
        config: &config,
        dirs,
    };

    match &cli.command {
        Command::Install(args) => run_install(&context, args, stderr),
        Command::Uninstall(args) => run_uninstall(&context, args, stderr),
        Command::List(args) => {
            let layout = resolve_layout(&context, args.prefix.as_deref())?;
            run_list(&layout, args.json, stdout)
        }
        Command::Audit(args) => run_audit_command(&context, args, stdout),
        Command::Render(args) => run_render(&context, args, stdout),
        Command::Package(args) => run_package(cli, args, stdout, stderr),
        Command::Completions(args) => {
            clap_complete::generate(
                args.shell,
                &mut Cli::command(),
                "todor-installer",
                stdout,
            );
            Ok(())
        }
    }
}

/// Resolves the prefix from the CLI, environment, config, or home directory.
fn resolve_layout(context: &RunContext<'_>, cli_prefix: Option<&Utf8Path>) -> Result<PrefixLayout> {
    let prefix = context.config.resolve_prefix(cli_prefix, context.dirs)?;
    log::debug!(target: "main", "using prefix {prefix}");
    Ok(PrefixLayout::new(prefix))
}

/// Loads the bundled records plus any configured extra directory.
fn load_history(context: &RunContext<'_>, cli_dir: Option<&Utf8Path>) -> Result<FormulaHistory> {
    let extra = context.config.resolve_formula_dir(cli_dir);
    let history = FormulaHistory::bundled_with_dir(extra.as_deref().map(Utf8Path::as_std_path))?;
    Ok(history)
}

fn run_install(context: &RunContext<'_>, args: &InstallArgs, stderr: &mut dyn Write) -> Result<()> {
    let history = load_history(context, args.formula_dir.as_deref())?;
    let layout = resolve_layout(context, args.prefix.as_deref())?;
    let downloader = HttpDownloader::with_timeout(context.config.download_timeout());

    let request = InstallRequest {
        history: &history,
        version: args.version.as_ref(),
        target: args.target.as_ref(),
        host: HostPlatform::current(),
        layout: &layout,
        overwrite: args.overwrite,
        dry_run: args.dry_run,
        quiet: context.cli.quiet,
    };
    install(&request, &downloader, &TarGzExtractor, stderr)?;
    Ok(())
}

fn run_uninstall(
    context: &RunContext<'_>,
    args: &UninstallArgs,
    stderr: &mut dyn Write,
) -> Result<()> {
    let layout = resolve_layout(context, args.prefix.as_deref())?;
    let removed = uninstall(&layout, &args.name)?;
    if !context.cli.quiet {
        write_stderr_line(
            stderr,
            format!(
                "Uninstalled {} ({} files) from {}",
                args.name,
                removed.len(),
                layout.prefix()
            ),
        );
    }
    Ok(())
}

fn run_audit_command(
    context: &RunContext<'_>,
    args: &AuditArgs,
    stdout: &mut dyn Write,
) -> Result<()> {
    let history = load_history(context, args.formula_dir.as_deref())?;
    if !args.online {
        return run_audit(&history, None, stdout);
    }
    let downloader = HttpDownloader::with_timeout(context.config.download_timeout());
    let online = OnlineAudit {
        downloader: &downloader,
        extractor: &TarGzExtractor,
        target: args.target.as_ref(),
    };
    run_audit(&history, Some(&online), stdout)
}

fn run_render(context: &RunContext<'_>, args: &RenderArgs, stdout: &mut dyn Write) -> Result<()> {
    let history = load_history(context, args.formula_dir.as_deref())?;
    let record = history.select(args.version.as_ref())?;
    write!(stdout, "{}", render_ruby(record))
        .map_err(|source| InstallerError::WriteFailed { source })
}

fn run_package(
    cli: &Cli,
    args: &PackageArgs,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<()> {
    let mut entries = vec![PackageEntry::binary(args.binary.as_std_path())?];
    for completion in &args.completion {
        entries.push(PackageEntry::completion(completion.as_std_path())?);
    }

    let output = package_release(PackageParams {
        name: args.name.clone(),
        version: args.version.clone(),
        target: args.target.clone(),
        entries,
        output_dir: args.output.clone().into_std_path_buf(),
    })?;

    if !cli.quiet {
        write_stderr_line(
            stderr,
            format!(
                "Created {} ({})",
                output.archive_path.display(),
                output.sha256
            ),
        );
    }
    write!(stdout, "{}", output.platform_entry())
        .map_err(|source| InstallerError::WriteFailed { source })
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}

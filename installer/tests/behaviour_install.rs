//! Behaviour-driven tests for verified installation.
//!
//! These scenarios drive the install pipeline end to end against archives
//! served from memory: digest verification, platform selection, conflict
//! handling, upgrades, and uninstall. Tests use the rstest-bdd v0.5.0
//! mutable world pattern.

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::fs;
use tempfile::TempDir;
use todor_formula::{FormulaError, FormulaHistory};
use todor_formula::mapping::InstallLocation;
use todor_formula::target::HostPlatform;
use todor_formula::version::Version;
use todor_installer::artefact::extraction::TarGzExtractor;
use todor_installer::error::InstallerError;
use todor_installer::layout::PrefixLayout;
use todor_installer::pipeline::{InstallOutcome, InstallRequest, install};
use todor_installer::receipt::ReceiptStore;
use todor_installer::test_utils::{ReleaseFixture, StubDownloader};
use todor_installer::uninstall::uninstall;

const UNRELATED_CONTENTS: &[u8] = b"unrelated file";

// ---------------------------------------------------------------------------
// World types
// ---------------------------------------------------------------------------

struct InstallWorld {
    _temp_dir: TempDir,
    layout: PrefixLayout,
    history: FormulaHistory,
    downloader: StubDownloader,
    result: Option<Result<InstallOutcome, InstallerError>>,
}

#[fixture]
fn world() -> InstallWorld {
    let temp_dir = TempDir::new().expect("temp dir");
    let prefix =
        Utf8PathBuf::from_path_buf(temp_dir.path().join("prefix")).expect("utf8 prefix");
    InstallWorld {
        _temp_dir: temp_dir,
        layout: PrefixLayout::new(prefix),
        history: FormulaHistory::new(),
        downloader: StubDownloader::new(),
        result: None,
    }
}

/// Publish `release`: add its record and serve its archive.
fn publish(world: &mut InstallWorld, release: &ReleaseFixture) {
    world
        .history
        .insert(release.record.clone())
        .expect("insert record");
    let downloader = std::mem::take(&mut world.downloader);
    world.downloader = downloader.serving(release).expect("serve archive");
}

fn run_install(
    world: &mut InstallWorld,
    host: HostPlatform,
    version: Option<&Version>,
    overwrite: bool,
) {
    let request = InstallRequest {
        history: &world.history,
        version,
        target: None,
        host,
        layout: &world.layout,
        overwrite,
        dry_run: false,
        quiet: true,
    };
    let result = install(&request, &world.downloader, &TarGzExtractor, &mut Vec::new());
    world.result = Some(result);
}

fn error(world: &InstallWorld) -> &InstallerError {
    match world.result.as_ref().expect("install attempted") {
        Ok(outcome) => panic!("expected an error, got {outcome:?}"),
        Err(err) => err,
    }
}

// ---------------------------------------------------------------------------
// Step definitions
// ---------------------------------------------------------------------------

#[given("a published todor release \"{version}\"")]
fn given_published_release(world: &mut InstallWorld, version: String) {
    let release = ReleaseFixture::todor(&version).expect("fixture");
    publish(world, &release);
}

#[given("a binary-only todor release \"{version}\" is published")]
fn given_binary_only_release(world: &mut InstallWorld, version: String) {
    let contents = format!("todor {version}");
    let release = ReleaseFixture::build(
        "todor",
        &version,
        &[("todor", contents.as_bytes())],
        &[("todor", "bin")],
        &["todor"],
    )
    .expect("fixture");
    publish(world, &release);
}

#[given("the published archive has been tampered with")]
fn given_tampered_archive(world: &mut InstallWorld) {
    let release = ReleaseFixture::todor("0.6.0").expect("fixture");
    let mut tampered = release.archive.clone();
    tampered.extend_from_slice(b"trailing bytes");
    let downloader = std::mem::take(&mut world.downloader);
    world.downloader = downloader.with_archive(release.url().expect("url"), tampered);
}

#[given("an unrelated file exists at \"{path}\"")]
fn given_unrelated_file(world: &mut InstallWorld, path: String) {
    let target = world.layout.prefix().join(&path);
    fs::create_dir_all(target.parent().expect("parent")).expect("mkdir");
    fs::write(&target, UNRELATED_CONTENTS).expect("write unrelated file");
}

#[given("todor \"{version}\" is installed")]
fn given_installed(world: &mut InstallWorld, version: String) {
    let version = Version::try_from(version).expect("version");
    run_install(world, HostPlatform::new("linux", "x86_64"), Some(&version), false);
    assert!(
        matches!(world.result.take(), Some(Ok(InstallOutcome::Installed { .. }))),
        "setup install must succeed"
    );
}

#[when("the release is installed on a \"{os}\" \"{arch}\" host")]
fn when_installed(world: &mut InstallWorld, os: String, arch: String) {
    run_install(world, HostPlatform::new(os, arch), None, false);
}

#[when("the release is installed with overwrite on a \"{os}\" \"{arch}\" host")]
fn when_installed_with_overwrite(world: &mut InstallWorld, os: String, arch: String) {
    run_install(world, HostPlatform::new(os, arch), None, true);
}

#[when("\"{name}\" is uninstalled")]
fn when_uninstalled(world: &mut InstallWorld, name: String) {
    uninstall(&world.layout, &name).expect("uninstall succeeds");
}

#[then("the install succeeds")]
fn then_install_succeeds(world: &mut InstallWorld) {
    let result = world.result.as_ref().expect("install attempted");
    assert!(
        matches!(result, Ok(InstallOutcome::Installed { .. })),
        "expected success, got {result:?}"
    );
}

#[then("the install fails with a checksum mismatch")]
fn then_checksum_mismatch(world: &mut InstallWorld) {
    let err = error(world);
    assert!(
        matches!(err, InstallerError::ChecksumMismatch { .. }),
        "expected checksum mismatch, got {err:?}"
    );
}

#[then("the install fails because the platform is unsupported")]
fn then_unsupported_platform(world: &mut InstallWorld) {
    let err = error(world);
    assert!(
        matches!(
            err,
            InstallerError::Formula(FormulaError::UnsupportedPlatform { .. })
        ),
        "expected unsupported platform, got {err:?}"
    );
}

#[then("the install fails with a conflicting file")]
fn then_conflicting_file(world: &mut InstallWorld) {
    let err = error(world);
    assert!(
        matches!(err, InstallerError::ConflictingFile { .. }),
        "expected conflicting file, got {err:?}"
    );
}

#[then("nothing was downloaded")]
fn then_nothing_downloaded(world: &mut InstallWorld) {
    assert!(world.downloader.requested_urls().is_empty());
}

#[then("the prefix contains \"{path}\"")]
fn then_prefix_contains(world: &mut InstallWorld, path: String) {
    let target = world.layout.prefix().join(&path);
    assert!(target.is_file(), "{target} should exist");
}

#[then("the prefix does not contain \"{path}\"")]
fn then_prefix_lacks(world: &mut InstallWorld, path: String) {
    let target = world.layout.prefix().join(&path);
    assert!(!target.exists(), "{target} should not exist");
}

#[then("the file at \"{path}\" is unchanged")]
fn then_file_unchanged(world: &mut InstallWorld, path: String) {
    let target = world.layout.prefix().join(&path);
    assert_eq!(fs::read(&target).expect("read"), UNRELATED_CONTENTS);
}

#[then("no files are placed in the prefix")]
fn then_no_files_placed(world: &mut InstallWorld) {
    for location in InstallLocation::ALL {
        let dir = world.layout.dir_for(location);
        let empty = fs::read_dir(&dir).map_or(true, |mut entries| entries.next().is_none());
        assert!(empty, "{dir} should be empty");
    }
}

#[then("the receipt for \"{name}\" lists {count} files")]
fn then_receipt_lists(world: &mut InstallWorld, name: String, count: usize) {
    let receipt = ReceiptStore::new(&world.layout)
        .load(&name)
        .expect("load receipt")
        .expect("receipt exists");
    assert_eq!(receipt.files.len(), count);
}

#[then("no receipt exists for \"{name}\"")]
fn then_no_receipt(world: &mut InstallWorld, name: String) {
    let receipt = ReceiptStore::new(&world.layout)
        .load(&name)
        .expect("load receipt");
    assert!(receipt.is_none());
}

// ---------------------------------------------------------------------------
// Scenario bindings
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/install.feature",
    name = "Install the latest release on a supported host"
)]
fn scenario_install_latest(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "A checksum mismatch aborts before any file is placed"
)]
fn scenario_checksum_mismatch(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "A host without a published archive is rejected"
)]
fn scenario_unsupported_host(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "An unrelated file blocks the install"
)]
fn scenario_unrelated_file(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "Overwrite replaces an unrelated file"
)]
fn scenario_overwrite(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "Upgrading removes files the new release no longer ships"
)]
fn scenario_upgrade(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "Uninstall removes exactly the recorded files"
)]
fn scenario_uninstall(world: InstallWorld) {
    let _ = world;
}

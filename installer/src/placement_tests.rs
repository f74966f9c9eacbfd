//! Unit tests for file placement.

use super::*;
use rstest::{fixture, rstest};
use tempfile::TempDir;
use todor_formula::target::TargetTriple;
use todor_formula::version::Version;

const RECORD: &str = r#"
name = "todor"
version = "0.6.0"
desc = "Find all your TODO notes with one command!"
homepage = "https://github.com/lavifb/todo_r"
url = "https://github.com/lavifb/todo_r/releases/download/v{version}/todor-v{version}-{target}.tar.gz"
conflicts_with = ["todor", "todo-r"]

[platforms.x86_64-unknown-linux-gnu]
sha256 = "80bf5e63811432cb29927bc3b9051a4123601e0fb749a0382829d73c55650c55"

[[install]]
source = "todor"
location = "bin"

[[install]]
source = "complete/todor.fish"
location = "fish-completion"

[[install]]
source = "complete/_todor"
location = "zsh-completion"
"#;

struct Workspace {
    _dir: TempDir,
    staged: PathBuf,
    layout: PrefixLayout,
    record: FormulaRecord,
}

#[fixture]
fn workspace() -> Workspace {
    let dir = TempDir::new().expect("temp dir");
    let staged = dir.path().join("staged");
    fs::create_dir_all(staged.join("complete")).expect("mkdir staged");
    fs::write(staged.join("todor"), b"todor 0.6.0").expect("write binary");
    fs::write(staged.join("complete/todor.fish"), b"complete -c todor").expect("write fish");
    fs::write(staged.join("complete/_todor"), b"#compdef todor").expect("write zsh");

    let prefix = Utf8PathBuf::from_path_buf(dir.path().join("prefix")).expect("utf8 prefix");
    Workspace {
        _dir: dir,
        staged,
        layout: PrefixLayout::new(prefix),
        record: FormulaRecord::from_toml_str(RECORD).expect("valid record"),
    }
}

fn receipt_for(name: &str, paths: &[&Utf8Path]) -> Receipt {
    Receipt::new(
        name,
        Version::try_from("0.5.1").expect("version"),
        TargetTriple::try_from("x86_64-unknown-linux-gnu").expect("target"),
        paths
            .iter()
            .map(|path| ReceiptEntry {
                path: path.to_path_buf(),
                location: InstallLocation::Bin,
                sha256: Sha256Digest::of_bytes(b"old"),
            })
            .collect(),
    )
}

#[rstest]
fn plan_maps_every_source(workspace: Workspace) {
    let plan = plan_placement(&workspace.layout, &workspace.record, &workspace.staged, None)
        .expect("plan");

    let destinations: Vec<&str> = plan.files().iter().map(|f| f.destination.as_str()).collect();
    let prefix = workspace.layout.prefix();
    assert_eq!(
        destinations,
        vec![
            prefix.join("bin/todor").as_str(),
            prefix.join("share/fish/vendor_completions.d/todor.fish").as_str(),
            prefix.join("share/zsh/site-functions/_todor").as_str(),
        ]
    );
    assert!(plan.stale().is_empty());
}

#[rstest]
fn plan_fails_on_missing_source(workspace: Workspace) {
    fs::remove_file(workspace.staged.join("complete/_todor")).expect("remove");

    let err = plan_placement(&workspace.layout, &workspace.record, &workspace.staged, None)
        .expect_err("missing source");
    assert!(matches!(
        err,
        InstallerError::MissingArchiveEntry { ref source_path, .. } if source_path == "complete/_todor"
    ));
}

#[rstest]
fn plan_lists_stale_files_from_previous_receipt(workspace: Workspace) {
    let bin = workspace.layout.dir_for(InstallLocation::Bin);
    let old_bash = workspace
        .layout
        .dir_for(InstallLocation::BashCompletion)
        .join("todor.bash-completion");
    let previous = receipt_for("todor", &[&bin.join("todor"), &old_bash]);

    let plan = plan_placement(
        &workspace.layout,
        &workspace.record,
        &workspace.staged,
        Some(&previous),
    )
    .expect("plan");
    assert_eq!(plan.stale(), &[old_bash]);
}

#[rstest]
fn modes_follow_location() {
    let planned = |location| PlannedFile {
        source: PathBuf::from("todor"),
        destination: Utf8PathBuf::from("/p/todor"),
        location,
    };
    assert_eq!(planned(InstallLocation::Bin).mode(), 0o755);
    assert_eq!(planned(InstallLocation::ZshCompletion).mode(), 0o644);
}

#[rstest]
fn foreign_file_is_a_conflict(workspace: Workspace) {
    let plan = plan_placement(&workspace.layout, &workspace.record, &workspace.staged, None)
        .expect("plan");
    let bin = workspace.layout.dir_for(InstallLocation::Bin);
    fs::create_dir_all(&bin).expect("mkdir");
    fs::write(bin.join("todor"), b"someone else's todor").expect("write foreign");

    let err = check_conflicts(&plan, &workspace.record, &[], false).expect_err("conflict");
    assert!(matches!(err, InstallerError::ConflictingFile { ref path } if *path == bin.join("todor")));
}

#[rstest]
fn overwrite_allows_foreign_file(workspace: Workspace) {
    let plan = plan_placement(&workspace.layout, &workspace.record, &workspace.staged, None)
        .expect("plan");
    let bin = workspace.layout.dir_for(InstallLocation::Bin);
    fs::create_dir_all(&bin).expect("mkdir");
    fs::write(bin.join("todor"), b"someone else's todor").expect("write foreign");

    check_conflicts(&plan, &workspace.record, &[], true).expect("overwrite permitted");
}

#[rstest]
fn own_files_are_not_conflicts(workspace: Workspace) {
    let plan = plan_placement(&workspace.layout, &workspace.record, &workspace.staged, None)
        .expect("plan");
    let bin = workspace.layout.dir_for(InstallLocation::Bin);
    fs::create_dir_all(&bin).expect("mkdir");
    fs::write(bin.join("todor"), b"todor 0.5.1").expect("write previous");
    let previous = receipt_for("todor", &[&bin.join("todor")]);

    check_conflicts(&plan, &workspace.record, &[previous], false).expect("own file");
}

#[rstest]
fn declared_conflicting_formula_blocks_install(workspace: Workspace) {
    let plan = plan_placement(&workspace.layout, &workspace.record, &workspace.staged, None)
        .expect("plan");
    let other = receipt_for("todo-r", &[]);

    let err = check_conflicts(&plan, &workspace.record, &[other], true).expect_err("conflict");
    assert!(matches!(
        err,
        InstallerError::FormulaConflict { ref other, .. } if other == "todo-r"
    ));
}

#[rstest]
fn self_conflict_entry_is_ignored(workspace: Workspace) {
    let plan = plan_placement(&workspace.layout, &workspace.record, &workspace.staged, None)
        .expect("plan");
    let own = receipt_for("todor", &[]);

    check_conflicts(&plan, &workspace.record, &[own], false).expect("self is not a conflict");
}

#[rstest]
fn apply_copies_files_and_records_digests(workspace: Workspace) {
    let plan = plan_placement(&workspace.layout, &workspace.record, &workspace.staged, None)
        .expect("plan");

    let applied = apply(&plan).expect("apply");

    let bin = workspace.layout.dir_for(InstallLocation::Bin).join("todor");
    assert_eq!(fs::read(&bin).expect("read installed"), b"todor 0.6.0");
    assert_eq!(applied.entries.len(), 3);
    assert_eq!(
        applied.entries.first().map(|e| e.sha256.clone()),
        Some(Sha256Digest::of_bytes(b"todor 0.6.0"))
    );
    assert!(applied.removed.is_empty());
}

#[cfg(unix)]
#[rstest]
fn apply_sets_unix_modes(workspace: Workspace) {
    use std::os::unix::fs::PermissionsExt;

    let plan = plan_placement(&workspace.layout, &workspace.record, &workspace.staged, None)
        .expect("plan");
    apply(&plan).expect("apply");

    let mode_of = |path: Utf8PathBuf| {
        fs::metadata(path).expect("metadata").permissions().mode() & 0o777
    };
    let layout = &workspace.layout;
    assert_eq!(mode_of(layout.dir_for(InstallLocation::Bin).join("todor")), 0o755);
    assert_eq!(
        mode_of(layout.dir_for(InstallLocation::ZshCompletion).join("_todor")),
        0o644
    );
}

#[rstest]
fn apply_removes_stale_files(workspace: Workspace) {
    let old_bash = workspace
        .layout
        .dir_for(InstallLocation::BashCompletion)
        .join("todor.bash-completion");
    fs::create_dir_all(old_bash.parent().expect("parent")).expect("mkdir");
    fs::write(&old_bash, b"old completion").expect("write stale");
    let previous = receipt_for("todor", &[&old_bash]);

    let plan = plan_placement(
        &workspace.layout,
        &workspace.record,
        &workspace.staged,
        Some(&previous),
    )
    .expect("plan");
    let applied = apply(&plan).expect("apply");

    assert_eq!(applied.removed, vec![old_bash.clone()]);
    assert!(!old_bash.exists());
}

#[rstest]
fn apply_rolls_back_created_files_on_failure(workspace: Workspace) {
    let plan = plan_placement(&workspace.layout, &workspace.record, &workspace.staged, None)
        .expect("plan");
    // The zsh destination's parent is a file, so the third copy fails.
    let zsh_dir = workspace.layout.dir_for(InstallLocation::ZshCompletion);
    fs::create_dir_all(zsh_dir.parent().expect("parent")).expect("mkdir");
    fs::write(&zsh_dir, b"not a directory").expect("block zsh dir");

    let err = apply(&plan).expect_err("copy fails");

    assert!(matches!(err, InstallerError::PlacementFailed { .. }));
    assert!(!workspace.layout.dir_for(InstallLocation::Bin).join("todor").exists());
    assert!(
        !workspace
            .layout
            .dir_for(InstallLocation::FishCompletion)
            .join("todor.fish")
            .exists()
    );
}

#[rstest]
fn ensure_writable_creates_prefix(workspace: Workspace) {
    ensure_writable(&workspace.layout).expect("writable");
    assert!(workspace.layout.prefix().is_dir());
}

#[rstest]
fn ensure_writable_rejects_file_prefix(workspace: Workspace) {
    let prefix = workspace.layout.prefix();
    fs::create_dir_all(prefix.parent().expect("parent")).expect("mkdir");
    fs::write(prefix, b"file").expect("write file prefix");

    let err = ensure_writable(&workspace.layout).expect_err("not writable");
    assert!(matches!(err, InstallerError::PrefixNotWritable { .. }));
}

//! Shared test utilities for the installer crate.
//!
//! Builds real `.tar.gz` release archives in memory, formula records that
//! pin their digests, and a downloader that serves those archives without
//! network access.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use todor_formula::digest::Sha256Digest;
use todor_formula::target::{HostPlatform, TargetTriple};
use todor_formula::{FormulaError, FormulaHistory, FormulaRecord};

use crate::artefact::download::{ArtefactDownloader, DownloadError};

/// Target every fixture record publishes.
pub const TEST_TARGET: &str = "x86_64-unknown-linux-gnu";

/// URL template used by fixture records.
pub const TEST_URL_TEMPLATE: &str =
    "https://releases.example.test/todor/v{version}/todor-v{version}-{target}.tar.gz";

/// Archive contents matching a 0.6.0 release.
pub const TODOR_FILES: [(&str, &[u8]); 4] = [
    ("todor", b"#!/bin/sh\necho todor\n"),
    ("complete/todor.bash-completion", b"complete -F _todor todor\n"),
    ("complete/todor.fish", b"complete -c todor -f\n"),
    ("complete/_todor", b"#compdef todor\n"),
];

/// Install mappings matching [`TODOR_FILES`].
pub const TODOR_MAPPINGS: [(&str, &str); 4] = [
    ("todor", "bin"),
    ("complete/todor.bash-completion", "bash-completion"),
    ("complete/todor.fish", "fish-completion"),
    ("complete/_todor", "zsh-completion"),
];

/// A Linux x86_64 host, which maps to [`TEST_TARGET`].
#[must_use]
pub fn linux_host() -> HostPlatform {
    HostPlatform::new("linux", "x86_64")
}

/// Build a gzip-compressed tar archive in memory.
///
/// # Errors
///
/// Returns an I/O error if the archive cannot be assembled.
pub fn tar_gz_bytes(files: &[(&str, &[u8])]) -> std::io::Result<Vec<u8>> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(if name.contains('/') { 0o644 } else { 0o755 });
        header.set_cksum();
        builder.append_data(&mut header, name, *contents)?;
    }
    builder.into_inner()?.finish()
}

/// Render a record for `name` at `version` pinning `sha256` for [`TEST_TARGET`].
#[must_use]
pub fn record_toml(
    name: &str,
    version: &str,
    sha256: &Sha256Digest,
    conflicts_with: &[&str],
    mappings: &[(&str, &str)],
) -> String {
    let mut toml = format!(
        concat!(
            "name = \"{name}\"\n",
            "version = \"{version}\"\n",
            "desc = \"Find all your TODO notes with one command!\"\n",
            "homepage = \"https://github.com/lavifb/todo_r\"\n",
            "url = \"{url}\"\n",
        ),
        name = name,
        version = version,
        url = TEST_URL_TEMPLATE,
    );
    if !conflicts_with.is_empty() {
        let quoted: Vec<String> = conflicts_with.iter().map(|c| format!("\"{c}\"")).collect();
        toml.push_str(&format!("conflicts_with = [{}]\n", quoted.join(", ")));
    }
    toml.push_str(&format!("\n[platforms.{TEST_TARGET}]\nsha256 = \"{sha256}\"\n"));
    for (source, location) in mappings {
        toml.push_str(&format!(
            "\n[[install]]\nsource = \"{source}\"\nlocation = \"{location}\"\n"
        ));
    }
    toml
}

/// A release archive together with the record that pins it.
#[derive(Debug, Clone)]
pub struct ReleaseFixture {
    /// Record describing the release.
    pub record: FormulaRecord,
    /// Archive bytes served for the record's URL.
    pub archive: Vec<u8>,
}

/// Failure while assembling a [`ReleaseFixture`].
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    /// The archive could not be built.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The generated record was rejected.
    #[error(transparent)]
    Formula(#[from] FormulaError),
}

impl ReleaseFixture {
    /// A `todor` release at `version` with the full 0.6.0 file set.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive or record cannot be built.
    pub fn todor(version: &str) -> Result<Self, FixtureError> {
        Self::build("todor", version, &TODOR_FILES, &TODOR_MAPPINGS, &["todor"])
    }

    /// A release with explicit contents and mappings.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive or record cannot be built.
    pub fn build(
        name: &str,
        version: &str,
        files: &[(&str, &[u8])],
        mappings: &[(&str, &str)],
        conflicts_with: &[&str],
    ) -> Result<Self, FixtureError> {
        let archive = tar_gz_bytes(files)?;
        let sha256 = Sha256Digest::of_bytes(&archive);
        let record = FormulaRecord::from_toml_str(&record_toml(
            name,
            version,
            &sha256,
            conflicts_with,
            mappings,
        ))?;
        Ok(Self { record, archive })
    }

    /// Download URL of the archive for [`TEST_TARGET`].
    ///
    /// # Errors
    ///
    /// Returns an error if the record has no branch for [`TEST_TARGET`].
    pub fn url(&self) -> Result<String, FormulaError> {
        let target = TargetTriple::try_from(TEST_TARGET)?;
        Ok(self.record.resolve(&target)?.url)
    }

    /// History holding only this record.
    ///
    /// # Errors
    ///
    /// Propagates history insertion failures.
    pub fn history(&self) -> Result<FormulaHistory, FormulaError> {
        let mut history = FormulaHistory::new();
        history.insert(self.record.clone())?;
        Ok(history)
    }
}

/// Downloader that serves archives from memory.
#[derive(Debug, Default)]
pub struct StubDownloader {
    archives: BTreeMap<String, Vec<u8>>,
    requests: RefCell<Vec<String>>,
}

impl StubDownloader {
    /// A downloader with nothing to serve.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` for `url`.
    #[must_use]
    pub fn with_archive(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.archives.insert(url.into(), bytes);
        self
    }

    /// Serve the fixture's archive at its URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the fixture has no URL for [`TEST_TARGET`].
    pub fn serving(self, fixture: &ReleaseFixture) -> Result<Self, FormulaError> {
        Ok(self.with_archive(fixture.url()?, fixture.archive.clone()))
    }

    /// URLs requested so far, in order.
    #[must_use]
    pub fn requested_urls(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl ArtefactDownloader for StubDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        self.requests.borrow_mut().push(url.to_owned());
        let bytes = self.archives.get(url).ok_or_else(|| DownloadError::NotFound {
            url: url.to_owned(),
        })?;
        let mut file = std::fs::File::create(dest)?;
        file.write_all(bytes)?;
        Ok(())
    }
}

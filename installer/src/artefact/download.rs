//! Release archive download.
//!
//! Provides a trait-based abstraction for fetching release archives from the
//! URL a formula record resolves to, enabling dependency injection for
//! testing.

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

/// Network timeout used when no configuration overrides it.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for downloading release archives.
///
/// Abstractions allow tests to mock HTTP behaviour without network access.
///
/// # Examples
///
/// ```
/// use todor_installer::artefact::download::HttpDownloader;
///
/// let downloader = HttpDownloader::default();
/// // Use downloader.download(url, dest) in production
/// # let _ = downloader;
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactDownloader {
    /// Download the resource at `url` into the file at `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::NotFound`] when the server answers 404,
    /// [`DownloadError::HttpError`] for other transport or status failures,
    /// and [`DownloadError::Io`] when the file cannot be written.
    fn download(&self, url: &str, dest: &Path) -> Result<(), DownloadError>;
}

/// Errors arising from archive download operations.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested archive was not found (HTTP 404).
    #[error("release archive not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP-based downloader using `ureq`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpDownloader {
    timeout: Duration,
}

impl HttpDownloader {
    /// Create a downloader with an explicit global request timeout.
    ///
    /// The first downloader used in a process fixes the timeout of the shared
    /// agent.
    #[must_use]
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// The configured request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_DOWNLOAD_TIMEOUT)
    }
}

impl ArtefactDownloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        log::debug!(target: "download", "fetching {url}");
        let response = http_agent(self.timeout)
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let mut file = std::fs::File::create(dest)?;
        let written = std::io::copy(&mut response.into_body().as_reader(), &mut file)
            .map_err(DownloadError::Io)?;
        log::trace!(target: "download", "wrote {written} bytes to {}", dest.display());
        Ok(())
    }
}

/// Shared `ureq` agent with request timeout configuration.
fn http_agent(timeout: Duration) -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

//! Persistent installer configuration.
//!
//! Settings live in `<config_dir>/todor-tap/config.toml`. Every field is
//! optional; a missing file means all defaults. The prefix is resolved in
//! order of precedence: command-line flag, `TODOR_TAP_PREFIX`, the
//! configuration file, then `<home>/.local`.

use std::path::Path;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::artefact::download::DEFAULT_DOWNLOAD_TIMEOUT;
use crate::dirs::{BaseDirs, default_prefix};
use crate::error::{InstallerError, Result};

/// Environment variable that overrides the configured prefix.
pub const PREFIX_ENV: &str = "TODOR_TAP_PREFIX";

/// File name of the configuration file inside the config directory.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Settings read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerConfig {
    /// Installation prefix.
    pub prefix: Option<Utf8PathBuf>,
    /// Extra directory of formula records to load alongside the bundled ones.
    pub formula_dir: Option<Utf8PathBuf>,
    /// Global timeout for archive downloads, in seconds.
    pub download_timeout_secs: u64,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            prefix: None,
            formula_dir: None,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT.as_secs(),
        }
    }
}

impl InstallerConfig {
    /// Load the configuration from the platform config directory.
    ///
    /// Returns the defaults when the directory cannot be determined or the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidConfig`] when the file exists but
    /// cannot be read or parsed.
    pub fn load(dirs: &dyn BaseDirs) -> Result<Self> {
        match dirs.config_dir() {
            Some(dir) => Self::load_from(&dir.join(CONFIG_FILENAME)),
            None => {
                log::debug!(target: "config", "no config directory; using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load the configuration from an explicit file path.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::InvalidConfig`] when the file exists but
    /// cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!(target: "config", "{} not found; using defaults", path.display());
            return Ok(Self::default());
        }
        let invalid = |reason: String| InstallerError::InvalidConfig {
            path: Utf8PathBuf::from(path.to_string_lossy().into_owned()),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let config: Self = toml::from_str(&content).map_err(|e| invalid(e.message().to_owned()))?;
        log::debug!(target: "config", "loaded {}", path.display());
        Ok(config)
    }

    /// Download timeout as a [`Duration`].
    #[must_use]
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Resolve the effective prefix.
    ///
    /// `cli` wins over `TODOR_TAP_PREFIX`, which wins over the configured
    /// prefix, which wins over `<home>/.local`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::NoPrefix`] when no source yields a UTF-8
    /// path.
    pub fn resolve_prefix(
        &self,
        cli: Option<&Utf8Path>,
        dirs: &dyn BaseDirs,
    ) -> Result<Utf8PathBuf> {
        if let Some(prefix) = cli {
            return Ok(prefix.to_path_buf());
        }
        if let Some(prefix) = std::env::var(PREFIX_ENV).ok().filter(|value| !value.is_empty()) {
            log::debug!(target: "config", "prefix from {PREFIX_ENV}");
            return Ok(Utf8PathBuf::from(prefix));
        }
        if let Some(prefix) = &self.prefix {
            return Ok(prefix.clone());
        }
        default_prefix(dirs)
            .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
            .ok_or(InstallerError::NoPrefix)
    }

    /// Resolve the extra formula directory; the CLI flag wins over the file.
    #[must_use]
    pub fn resolve_formula_dir(&self, cli: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
        cli.map(Utf8Path::to_path_buf)
            .or_else(|| self.formula_dir.clone())
    }
}

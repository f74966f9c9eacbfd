//! Installation prefix layout.
//!
//! Maps each [`InstallLocation`] to a directory under the prefix, following
//! the conventions package managers use for executables and shell
//! completions, and locates the installer's own bookkeeping files.

use camino::{Utf8Path, Utf8PathBuf};
use todor_formula::mapping::{InstallLocation, InstallMapping};

/// Directory names under a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixLayout {
    prefix: Utf8PathBuf,
}

impl PrefixLayout {
    /// Build the layout rooted at `prefix`.
    ///
    /// # Example
    ///
    /// ```
    /// use todor_formula::mapping::InstallLocation;
    /// use todor_installer::layout::PrefixLayout;
    ///
    /// let layout = PrefixLayout::new("/usr/local");
    /// assert_eq!(layout.dir_for(InstallLocation::Bin), "/usr/local/bin");
    /// assert_eq!(
    ///     layout.dir_for(InstallLocation::ZshCompletion),
    ///     "/usr/local/share/zsh/site-functions"
    /// );
    /// ```
    #[must_use]
    pub fn new(prefix: impl Into<Utf8PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The prefix root.
    #[must_use]
    pub fn prefix(&self) -> &Utf8Path {
        &self.prefix
    }

    /// Directory that receives files for `location`.
    #[must_use]
    pub fn dir_for(&self, location: InstallLocation) -> Utf8PathBuf {
        match location {
            InstallLocation::Bin => self.prefix.join("bin"),
            InstallLocation::BashCompletion => self.prefix.join("etc").join("bash_completion.d"),
            InstallLocation::FishCompletion => self
                .prefix
                .join("share")
                .join("fish")
                .join("vendor_completions.d"),
            InstallLocation::ZshCompletion => {
                self.prefix.join("share").join("zsh").join("site-functions")
            }
        }
    }

    /// Full destination path for one mapping.
    #[must_use]
    pub fn destination(&self, mapping: &InstallMapping) -> Utf8PathBuf {
        self.dir_for(mapping.location())
            .join(mapping.installed_name())
    }

    /// Root of the installer's own state.
    #[must_use]
    pub fn state_dir(&self) -> Utf8PathBuf {
        self.prefix.join("var").join("todor-tap")
    }

    /// Directory holding one JSON receipt per installed formula.
    #[must_use]
    pub fn receipts_dir(&self) -> Utf8PathBuf {
        self.state_dir().join("receipts")
    }

    /// Advisory lock file serialising installs into this prefix.
    #[must_use]
    pub fn lock_path(&self) -> Utf8PathBuf {
        self.state_dir().join("install.lock")
    }
}

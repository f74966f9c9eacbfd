//! Directory resolution abstraction for platform-specific paths.
//!
//! The installer needs the user's home directory (for the default prefix)
//! and its own configuration directory. Both come from `directories-next`
//! in production and from mocks in tests.

use std::path::PathBuf;

use directories_next::ProjectDirs;

/// Application name used for configuration and data directories.
pub const APP_NAME: &str = "todor-tap";

/// Source of the base directories the installer depends on.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// The current user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;

    /// Directory holding `config.toml`.
    fn config_dir(&self) -> Option<PathBuf>;
}

/// Fallback installation prefix, `<home>/.local`.
#[must_use]
pub fn default_prefix(dirs: &dyn BaseDirs) -> Option<PathBuf> {
    dirs.home_dir().map(|home| home.join(".local"))
}

/// [`BaseDirs`] backed by the platform conventions of `directories-next`.
#[derive(Debug, Clone)]
pub struct SystemBaseDirs {
    base: directories_next::BaseDirs,
    project: Option<ProjectDirs>,
}

impl SystemBaseDirs {
    /// Resolve the platform directories.
    ///
    /// Returns `None` when no home directory can be determined.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use todor_installer::dirs::{BaseDirs, SystemBaseDirs};
    ///
    /// let dirs = SystemBaseDirs::new().expect("failed to initialise directories");
    /// println!("{:?}", dirs.config_dir());
    /// ```
    #[must_use]
    pub fn new() -> Option<Self> {
        let base = directories_next::BaseDirs::new()?;
        let project = ProjectDirs::from("", "", APP_NAME);
        Some(Self { base, project })
    }
}

impl BaseDirs for SystemBaseDirs {
    fn home_dir(&self) -> Option<PathBuf> {
        Some(self.base.home_dir().to_path_buf())
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.project
            .as_ref()
            .map(|project| project.config_dir().to_path_buf())
    }
}

/// [`BaseDirs`] for environments without a resolvable home directory.
///
/// Every lookup returns `None`, so the prefix must come from the command
/// line, the environment, or configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBaseDirs;

impl BaseDirs for NoBaseDirs {
    fn home_dir(&self) -> Option<PathBuf> {
        None
    }

    fn config_dir(&self) -> Option<PathBuf> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prefix_is_dot_local_under_home() {
        let mut dirs = MockBaseDirs::new();
        dirs.expect_home_dir()
            .returning(|| Some(PathBuf::from("/home/ada")));

        assert_eq!(default_prefix(&dirs), Some(PathBuf::from("/home/ada/.local")));
    }

    #[test]
    fn default_prefix_is_none_without_home() {
        let mut dirs = MockBaseDirs::new();
        dirs.expect_home_dir().returning(|| None);

        assert_eq!(default_prefix(&dirs), None);
    }

    #[test]
    fn system_config_dir_names_the_application() {
        let Some(dirs) = SystemBaseDirs::new() else {
            return;
        };
        if let Some(config) = dirs.config_dir() {
            assert!(config.to_string_lossy().contains(APP_NAME));
        }
    }

    #[test]
    fn no_base_dirs_resolves_nothing() {
        assert_eq!(default_prefix(&NoBaseDirs), None);
        assert_eq!(NoBaseDirs.config_dir(), None);
    }
}

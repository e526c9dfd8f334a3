//! core::paths
//!
//! Centralized path routing for an enlistment's GVFS storage.
//!
//! # Architecture
//!
//! A GVFS enlistment is the directory that contains the `.gvfs` folder; the
//! git working tree lives somewhere beneath it. Hooks are started by git
//! from inside the working tree, so the enlistment is found by walking up
//! from the working directory.
//!
//! # Storage Layout
//!
//! - `.gvfs/GVFS_NetCorePipe` - Service endpoint (unix-domain socket)
//! - `.gvfs/hooks.toml` - Enlistment-scoped hook configuration
//! - `.gvfs/UpgradeAvailable` - Marker written when an upgrade is staged
//!
//! On Windows the service endpoint is a named pipe derived from the
//! enlistment root instead of a file under `.gvfs`.
//!
//! # Example
//!
//! ```
//! use gvfs_hooks::core::paths::EnlistmentPaths;
//! use std::path::PathBuf;
//!
//! let paths = EnlistmentPaths::new(PathBuf::from("/repos/os"));
//! assert_eq!(paths.config_path(), PathBuf::from("/repos/os/.gvfs/hooks.toml"));
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Name of the per-enlistment metadata directory.
pub const DOT_GVFS: &str = ".gvfs";

/// Errors from enlistment discovery.
#[derive(Debug, Error)]
pub enum PathsError {
    #[error("'{0}' is not inside a GVFS enlistment")]
    NotAnEnlistment(PathBuf),
}

/// Paths derived from an enlistment root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnlistmentPaths {
    /// Directory containing `.gvfs`.
    pub root: PathBuf,
}

impl EnlistmentPaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Find the enlistment containing `start`.
    ///
    /// # Errors
    ///
    /// [`PathsError::NotAnEnlistment`] if no ancestor has a `.gvfs` directory.
    pub fn discover(start: &Path) -> Result<Self, PathsError> {
        start
            .ancestors()
            .find(|dir| dir.join(DOT_GVFS).is_dir())
            .map(|dir| Self::new(dir.to_path_buf()))
            .ok_or_else(|| PathsError::NotAnEnlistment(start.to_path_buf()))
    }

    pub fn dot_gvfs(&self) -> PathBuf {
        self.root.join(DOT_GVFS)
    }

    /// Enlistment-scoped hook configuration.
    pub fn config_path(&self) -> PathBuf {
        self.dot_gvfs().join("hooks.toml")
    }

    /// Marker file indicating a staged upgrade.
    pub fn upgrade_marker_path(&self) -> PathBuf {
        self.dot_gvfs().join("UpgradeAvailable")
    }

    /// Endpoint the service listens on for this enlistment.
    #[cfg(not(windows))]
    pub fn pipe_path(&self) -> PathBuf {
        self.dot_gvfs().join("GVFS_NetCorePipe")
    }

    /// Endpoint the service listens on for this enlistment.
    #[cfg(windows)]
    pub fn pipe_path(&self) -> PathBuf {
        let name = self.root.to_string_lossy().to_uppercase().replace(':', "_");
        PathBuf::from(format!(r"\\.\pipe\GVFS_{name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn discover_from_nested_directory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".gvfs")).unwrap();
        let nested = temp.path().join("src").join("deep").join("dir");
        fs::create_dir_all(&nested).unwrap();

        let paths = EnlistmentPaths::discover(&nested).unwrap();
        assert_eq!(paths.root, temp.path());
    }

    #[test]
    fn discover_ignores_dot_gvfs_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".gvfs"), "not a directory").unwrap();

        let result = EnlistmentPaths::discover(temp.path());
        assert!(matches!(result, Err(PathsError::NotAnEnlistment(_))));
    }

    #[test]
    fn layout() {
        let paths = EnlistmentPaths::new(PathBuf::from("/e"));
        assert_eq!(paths.dot_gvfs(), PathBuf::from("/e/.gvfs"));
        assert_eq!(
            paths.upgrade_marker_path(),
            PathBuf::from("/e/.gvfs/UpgradeAvailable")
        );
        #[cfg(not(windows))]
        assert_eq!(
            paths.pipe_path(),
            PathBuf::from("/e/.gvfs/GVFS_NetCorePipe")
        );
    }
}

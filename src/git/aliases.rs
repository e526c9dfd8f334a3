//! git::aliases
//!
//! Alias lookup through libgit2.
//!
//! The configuration is opened lazily: most verbs are classified from the
//! built-in tables and never reach alias lookup, so the common path does
//! not pay for opening the repository.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{AliasResolver, GitError};

/// [`AliasResolver`] reading `alias.<verb>` from the repository containing
/// a directory, falling back to the user's global configuration.
#[derive(Debug, Clone)]
pub struct GitAliases {
    cwd: PathBuf,
}

impl GitAliases {
    pub fn new(cwd: &Path) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
        }
    }

    /// Read-only snapshot of the effective configuration.
    ///
    /// # Errors
    ///
    /// [`GitError::NoConfig`] when neither a repository nor a default
    /// configuration can be opened.
    fn snapshot(&self) -> Result<git2::Config, GitError> {
        let mut config = match git2::Repository::discover(&self.cwd) {
            Ok(repo) => repo.config()?,
            Err(_) => git2::Config::open_default().map_err(|_| GitError::NoConfig {
                path: self.cwd.clone(),
            })?,
        };
        Ok(config.snapshot()?)
    }

    /// The alias expansion for `verb`, if one is configured.
    pub fn lookup(&self, verb: &str) -> Result<Option<String>, GitError> {
        let config = self.snapshot()?;
        match config.get_string(&format!("alias.{verb}")) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl AliasResolver for GitAliases {
    fn is_alias(&self, verb: &str) -> bool {
        match self.lookup(verb) {
            Ok(Some(value)) => !value.trim().is_empty(),
            Ok(None) => false,
            Err(e) => {
                debug!(verb, error = %e, "alias lookup failed");
                false
            }
        }
    }
}

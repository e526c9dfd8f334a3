//! git
//!
//! The hooks' only doorway to git configuration.
//!
//! # Architecture
//!
//! The hooks never shell out to the git binary. The one thing they need
//! from git itself, alias lookup for verbs the classifier does not know,
//! is answered from the repository's configuration through `git2`. No
//! other module imports `git2`.
//!
//! The classifier consumes aliases through [`AliasResolver`] so it stays a
//! pure function of its inputs in tests.
//!
//! # Example
//!
//! ```no_run
//! use gvfs_hooks::git::{AliasResolver, GitAliases};
//! use std::path::Path;
//!
//! let aliases = GitAliases::new(Path::new("."));
//! if aliases.is_alias("co") {
//!     println!("'co' is an alias");
//! }
//! ```

mod aliases;

pub use aliases::GitAliases;

use std::path::PathBuf;

use thiserror::Error;

/// Errors from reading git configuration.
#[derive(Debug, Error)]
pub enum GitError {
    /// Neither a repository nor a user-level configuration could be opened.
    #[error("no git configuration found from {path}")]
    NoConfig {
        /// Directory the search started from
        path: PathBuf,
    },

    /// libgit2 failure.
    #[error("git error: {0}")]
    Internal(#[from] git2::Error),
}

/// Answers whether a verb is a configured git alias.
pub trait AliasResolver {
    /// `true` when `alias.<verb>` is set to a non-empty value.
    fn is_alias(&self, verb: &str) -> bool;
}

/// Resolver that knows no aliases.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAliases;

impl AliasResolver for NoAliases {
    fn is_alias(&self, _verb: &str) -> bool {
        false
    }
}

impl<T: AliasResolver + ?Sized> AliasResolver for &T {
    fn is_alias(&self, verb: &str) -> bool {
        (**self).is_alias(verb)
    }
}

//! engine
//!
//! Everything a hook does between parsing its arguments and exiting.
//!
//! # Architecture
//!
//! ```text
//! HookArgs -> classify -> [connect] -> LockClient (acquire | release) -> report / notice
//! ```
//!
//! - [`classify`] - Decides whether a git invocation needs the lock
//! - [`client`] - Acquire with busy-retry, single-shot Release
//! - [`hooks`] - The pre-command and post-command flows
//! - [`report`] - Recovery instructions after a Release
//! - [`notice`] - Occasional upgrade reminder
//!
//! # Invariants
//!
//! - Classification is total and pure
//! - Only a busy response is retried; everything else ends the exchange
//! - The post-command hook never changes git's outcome
//!
//! # Example
//!
//! ```no_run
//! use gvfs_hooks::core::args::HookArgs;
//! use gvfs_hooks::core::process::SystemProcesses;
//! use gvfs_hooks::engine::classify::ProcessEnv;
//! use gvfs_hooks::engine::hooks::{HookRunner, HookSettings};
//! use gvfs_hooks::git::NoAliases;
//! use gvfs_hooks::core::config::Config;
//! use gvfs_hooks::transport::PipeConnector;
//! use std::path::PathBuf;
//!
//! let args = HookArgs::parse(&["checkout", "main", "--git-pid=4242"]).unwrap();
//! let connector = PipeConnector::new(Some(PathBuf::from("/repo/.gvfs/GVFS_NetCorePipe")), PathBuf::from("/repo"));
//! let settings = HookSettings::from_config(&Config::default(), false);
//! let runner = HookRunner::new(connector, SystemProcesses, NoAliases, ProcessEnv, settings);
//!
//! runner.pre_command(&args, &mut std::io::stdout()).unwrap();
//! ```

pub mod classify;
pub mod client;
pub mod hooks;
pub mod notice;
pub mod report;

pub use classify::{classify, Classifier, EnvLookup, LockDecision, ProcessEnv};
pub use client::{LockClient, LockClientError, RetryPolicy};
pub use hooks::{HookError, HookRunner, HookSettings, PostCommandOutcome, PreCommandOutcome};

use std::io::IsTerminal;
use std::path::PathBuf;

/// Environment variable that marks an unattended session.
pub const UNATTENDED_ENV: &str = "GVFS_UNATTENDED";

/// Execution context for a hook.
///
/// Contains global settings derived from CLI flags and the environment.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// A person is watching; progress and reminders may be shown.
    pub interactive: bool,
}

/// `GVFS_UNATTENDED=1` marks automation (build agents, scripts).
pub fn is_unattended(env: &impl EnvLookup) -> bool {
    env.var(UNATTENDED_ENV).as_deref() == Some("1")
}

/// Interactive when not unattended and stdout is a terminal.
pub fn is_interactive(env: &impl EnvLookup) -> bool {
    !is_unattended(env) && std::io::stdout().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn unattended_only_for_one() {
        let mut env: HashMap<String, String> = HashMap::new();
        assert!(!is_unattended(&env));

        env.insert(UNATTENDED_ENV.to_string(), "1".to_string());
        assert!(is_unattended(&env));
        assert!(!is_interactive(&env));

        env.insert(UNATTENDED_ENV.to_string(), "true".to_string());
        assert!(!is_unattended(&env));
    }

    #[test]
    fn context_default_is_quiet() {
        let ctx = Context::default();
        assert!(ctx.cwd.is_none());
        assert!(!ctx.interactive);
    }
}

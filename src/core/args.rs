//! core::args
//!
//! The git invocation a hook was started for.
//!
//! Git starts the hooks as
//!
//! ```text
//! gvfs-hooks pre-command <verb> [git args...] --git-pid=<pid>
//! gvfs-hooks post-command <verb> [git args...] --git-pid=<pid> --exit_code=<n>
//! ```
//!
//! `--git-pid` and `--exit_code` are added by git for the hook and are not
//! part of the user's command; they are stripped from the reconstructed
//! command line.

use thiserror::Error;

/// Internal argument carrying the triggering git process id.
pub const GIT_PID_ARG: &str = "--git-pid=";

/// Internal argument carrying git's exit code (post-command only).
pub const EXIT_CODE_ARG: &str = "--exit_code=";

/// Errors from parsing the hook's arguments.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArgsError {
    #[error("usage: gvfs-hooks <pre-command|post-command> <git verb> [args...] --git-pid=<pid>")]
    MissingCommand,

    #[error("missing required argument '--git-pid=<pid>'")]
    MissingPid,

    #[error("invalid git pid '{0}'")]
    InvalidPid(String),

    #[error("invalid git exit code '{0}'")]
    InvalidExitCode(String),
}

/// A parsed hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookArgs {
    /// User-visible git arguments, verb first, internal arguments removed.
    args: Vec<String>,
    /// Pid of the git process that started the hook.
    pid: u32,
    /// Git's exit code, when git reported one.
    exit_code: Option<i32>,
}

impl HookArgs {
    /// Parse the arguments following the hook name.
    ///
    /// # Errors
    ///
    /// - [`ArgsError::MissingCommand`] when there is no git verb
    /// - [`ArgsError::MissingPid`] / [`ArgsError::InvalidPid`] for `--git-pid`
    pub fn parse<S: AsRef<str>>(raw: &[S]) -> Result<Self, ArgsError> {
        let mut args = Vec::with_capacity(raw.len());
        let mut pid = None;
        let mut exit_code = None;

        for arg in raw.iter().map(AsRef::as_ref) {
            if let Some(value) = arg.strip_prefix(GIT_PID_ARG) {
                let parsed = value
                    .parse::<u32>()
                    .ok()
                    .filter(|&p| p != 0)
                    .ok_or_else(|| ArgsError::InvalidPid(value.to_string()))?;
                pid = Some(parsed);
            } else if let Some(value) = arg.strip_prefix(EXIT_CODE_ARG) {
                let parsed = value
                    .parse::<i32>()
                    .map_err(|_| ArgsError::InvalidExitCode(value.to_string()))?;
                exit_code = Some(parsed);
            } else {
                args.push(arg.to_string());
            }
        }

        if args.is_empty() {
            return Err(ArgsError::MissingCommand);
        }
        let pid = pid.ok_or(ArgsError::MissingPid)?;

        Ok(Self {
            args,
            pid,
            exit_code,
        })
    }

    /// The git verb, as typed.
    pub fn verb(&self) -> &str {
        &self.args[0]
    }

    /// Arguments after the verb.
    pub fn verb_args(&self) -> &[String] {
        &self.args[1..]
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// The command line reported to the service, e.g. `git commit -m msg`.
    pub fn command_line(&self) -> String {
        format!("git {}", self.args.join(" "))
    }
}

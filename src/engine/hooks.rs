//! engine::hooks
//!
//! The pre-command and post-command entry points.
//!
//! # Architecture
//!
//! ```text
//! pre-command:  blocked? -> classify -> [skip] -> connect -> pid alive? -> acquire
//! post-command: classify -> [skip] -> connect -> release -> report -> upgrade notice
//! ```
//!
//! [`HookRunner`] is generic over every collaborator that touches the
//! outside world (channel, processes, aliases, environment) and writes
//! user-facing text to a caller-supplied writer, so both flows are tested
//! end to end in memory.
//!
//! # Invariants
//!
//! - Pre-command failures are fatal and abort the git command.
//! - Post-command never fails: git has already run, so release problems are
//!   printed as warnings.
//! - Both hooks classify with the same inputs and therefore agree.

use std::io::{self, Write};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::classify::{blocked_reason, Classifier, EnvLookup, LockDecision};
use super::client::{LockClient, LockClientError, RetryPolicy};
use super::notice::{UpgradeReminder, UPGRADE_MESSAGE};
use super::report::render_release_outcome;
use crate::core::args::{ArgsError, HookArgs};
use crate::core::config::{Config, ConfigError};
use crate::core::process::ProcessInspector;
use crate::git::AliasResolver;
use crate::protocol::{LockRequest, LockResponse};
use crate::transport::{Connect, TransportError};
use crate::ui::output;
use crate::ui::progress::{NoProgress, Spinner};

/// Environment variable git sets to correlate trace2 sessions.
pub const SESSION_ID_ENV: &str = "GIT_TRACE2_PARENT_SID";

pub const NOT_READY_MESSAGE: &str =
    "GVFS has not finished initializing, please wait a few seconds and try again.";
pub const UNMOUNTING_MESSAGE: &str = "GVFS is unmounting.";

/// Errors that abort a hook.
#[derive(Debug, Error)]
pub enum HookError {
    #[error(transparent)]
    Usage(#[from] ArgsError),

    /// The command must never run in an enlistment.
    #[error("{0}")]
    Blocked(&'static str),

    #[error("Unable to find the git process with id {pid} that started this hook")]
    ProcessLookup { pid: u32 },

    #[error(transparent)]
    Connect(#[from] TransportError),

    #[error("Failed to communicate with GVFS: {0}")]
    Channel(#[source] io::Error),

    #[error("{0}")]
    Protocol(String),

    #[error("{0}")]
    ServiceUnavailable(&'static str),

    #[error("Gave up waiting for the GVFS lock after {attempts} attempts. {reason}")]
    RetriesExhausted { attempts: u32, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<LockClientError> for HookError {
    fn from(err: LockClientError) -> Self {
        match err {
            LockClientError::Channel(e) => HookError::Channel(e),
            LockClientError::Protocol(e) => HookError::Protocol(e.to_string()),
            e @ LockClientError::UnexpectedResponse { .. } => HookError::Protocol(e.to_string()),
            LockClientError::RetriesExhausted { attempts, reason } => {
                HookError::RetriesExhausted { attempts, reason }
            }
        }
    }
}

/// Result of a successful pre-command hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreCommandOutcome {
    /// The command does not need the service.
    Skipped,
    /// The lock is held for the git process.
    LockAcquired,
    /// The lock was free; it was not taken.
    LockAvailable,
}

/// What the post-command hook did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostCommandOutcome {
    /// No lock was taken, nothing to release.
    Skipped,
    /// The lock was released; `failures` files need manual recovery.
    Released { failures: usize },
    /// The release could not be completed; a warning was printed.
    ReleaseFailed,
}

/// Settings for one hook run.
#[derive(Debug, Clone)]
pub struct HookSettings {
    /// A person is watching stdout.
    pub interactive: bool,
    /// Show a spinner while waiting (only when interactive).
    pub progress: bool,
    pub release_display_threshold: usize,
    pub retry: RetryPolicy,
    pub reminder: UpgradeReminder,
}

impl HookSettings {
    pub fn from_config(config: &Config, interactive: bool) -> Self {
        Self {
            interactive,
            progress: config.progress(),
            release_display_threshold: config.release_display_threshold(),
            retry: RetryPolicy::from_config(config),
            reminder: UpgradeReminder::from_config(config),
        }
    }
}

/// Runs the hooks against a set of collaborators.
#[derive(Debug)]
pub struct HookRunner<C, P, A, E> {
    connector: C,
    processes: P,
    aliases: A,
    env: E,
    settings: HookSettings,
}

impl<C, P, A, E> HookRunner<C, P, A, E>
where
    C: Connect,
    P: ProcessInspector,
    A: AliasResolver,
    E: EnvLookup,
{
    pub fn new(connector: C, processes: P, aliases: A, env: E, settings: HookSettings) -> Self {
        Self {
            connector,
            processes,
            aliases,
            env,
            settings,
        }
    }

    fn classify(&self, args: &HookArgs) -> LockDecision {
        let decision =
            Classifier::new(&self.env, &self.aliases).classify(args.verb(), args.verb_args());
        debug!(verb = args.verb(), ?decision, "classified");
        decision
    }

    /// Run the pre-command hook.
    ///
    /// # Errors
    ///
    /// Any [`HookError`]; the caller prints it and exits non-zero so git
    /// does not run the command.
    pub fn pre_command(
        &self,
        args: &HookArgs,
        out: &mut dyn Write,
    ) -> Result<PreCommandOutcome, HookError> {
        if let Some(reason) = blocked_reason(args.verb()) {
            return Err(HookError::Blocked(reason));
        }

        let decision = self.classify(args);
        if !decision.needs_service() {
            return Ok(PreCommandOutcome::Skipped);
        }

        let channel = self.connector.connect()?;

        let pid = args.pid();
        if !self.processes.is_running(pid) {
            return Err(HookError::ProcessLookup { pid });
        }

        let request = LockRequest::Acquire {
            pid,
            is_elevated: self.processes.is_elevated(),
            check_availability_only: decision == LockDecision::AvailabilityCheckOnly,
            command: args.command_line(),
            session_id: self.env.var(SESSION_ID_ENV).unwrap_or_default(),
        };

        let mut client = LockClient::new(channel, self.settings.retry);
        let response = if self.settings.interactive && self.settings.progress {
            let mut spinner = Spinner::new(&mut *out);
            client.acquire(&request, &mut spinner)?
        } else {
            client.acquire(&request, &mut NoProgress)?
        };

        match response {
            LockResponse::Accepted => {
                info!(pid, command = request.command(), "lock acquired");
                Ok(PreCommandOutcome::LockAcquired)
            }
            LockResponse::Available => Ok(PreCommandOutcome::LockAvailable),
            LockResponse::ServiceNotReady => Err(HookError::ServiceUnavailable(NOT_READY_MESSAGE)),
            LockResponse::ServiceUnmounting => {
                Err(HookError::ServiceUnavailable(UNMOUNTING_MESSAGE))
            }
            other => Err(HookError::Protocol(format!(
                "unexpected response '{}' to '{}'",
                other.name(),
                request.header()
            ))),
        }
    }

    /// Run the post-command hook. Never fails.
    pub fn post_command(&self, args: &HookArgs, out: &mut dyn Write) -> PostCommandOutcome {
        debug!(exit_code = ?args.exit_code(), "git command finished");
        let outcome = if self.classify(args) == LockDecision::RequiresLock {
            self.release(args, out)
        } else {
            PostCommandOutcome::Skipped
        };

        if self
            .settings
            .reminder
            .should_remind(self.settings.interactive, &mut rand::rng())
        {
            output::print(out, UPGRADE_MESSAGE);
        }

        outcome
    }

    fn release(&self, args: &HookArgs, out: &mut dyn Write) -> PostCommandOutcome {
        let request = LockRequest::Release {
            pid: args.pid(),
            is_elevated: self.processes.is_elevated(),
            command: args.command_line(),
        };

        let response = self
            .connector
            .connect()
            .map_err(HookError::from)
            .and_then(|channel| {
                LockClient::new(channel, self.settings.retry)
                    .release(&request)
                    .map_err(HookError::from)
            });

        match response {
            Ok(LockResponse::ReleaseOutcome(outcome)) => {
                if let Some(report) =
                    render_release_outcome(&outcome, self.settings.release_display_threshold)
                {
                    output::print(out, report);
                }
                PostCommandOutcome::Released {
                    failures: outcome.failure_count(),
                }
            }
            Ok(_) => PostCommandOutcome::Released { failures: 0 },
            Err(e) => {
                warn!(error = %e, "release failed");
                output::warn(out, format!("Failed to release the GVFS lock: {e}"));
                PostCommandOutcome::ReleaseFailed
            }
        }
    }
}

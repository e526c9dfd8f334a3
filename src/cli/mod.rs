//! cli
//!
//! Command-line interface layer for the GVFS hooks.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Initialize logging
//! - Assemble the real collaborators and hand off to the engine
//! - Classify before loading configuration
//! - Map the outcome to a process exit code
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! [`crate::engine::hooks::HookRunner`]. Messages meant for the user go to
//! stdout, where git shows them; logs go to stderr.
//!
//! # Exit Codes
//!
//! - pre-command: 0 lets git proceed, 1 aborts the git command
//! - post-command: always 0; problems, including malformed arguments, are
//!   printed as warnings

pub mod args;

pub use args::{Cli, HookCommand};

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::core::args::{ArgsError, HookArgs};
use crate::core::config::Config;
use crate::core::paths::EnlistmentPaths;
use crate::core::process::SystemProcesses;
use crate::engine::classify::blocked_reason;
use crate::engine::{self, Classifier, HookRunner, HookSettings, LockDecision, ProcessEnv};
use crate::git::GitAliases;
use crate::transport::PipeConnector;
use crate::ui::output;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "GVFS_HOOKS_LOG";

/// Initialize the tracing subscriber.
///
/// Filter from `GVFS_HOOKS_LOG`, defaulting to `warn`; `--debug` forces
/// `debug`. Output goes to stderr so stdout carries only user messages.
pub fn init_tracing(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug)?;

    let ctx = engine::Context {
        cwd: cli.cwd.clone(),
        interactive: engine::is_interactive(&ProcessEnv),
    };

    let mut stdout = io::stdout();
    let hook_args = match HookArgs::parse(cli.command.git_args()) {
        Ok(hook_args) => hook_args,
        Err(e) => return Ok(usage_error(&cli.command, &e, &mut stdout)),
    };

    let cwd = match &ctx.cwd {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir().context("Failed to determine the working directory")?,
    };

    match cli.command {
        HookCommand::PreCommand { .. } => pre_command(&ctx, &cwd, &hook_args, &mut stdout),
        HookCommand::PostCommand { .. } => post_command(&ctx, &cwd, &hook_args, &mut stdout),
    }
}

/// Malformed hook arguments abort pre-command; post-command only warns.
fn usage_error(command: &HookCommand, e: &ArgsError, out: &mut dyn Write) -> ExitCode {
    match command {
        HookCommand::PreCommand { .. } => {
            output::print(out, e);
            ExitCode::FAILURE
        }
        HookCommand::PostCommand { .. } => {
            warn!(error = %e, "post-command arguments");
            output::warn(out, e);
            ExitCode::SUCCESS
        }
    }
}

fn pre_command(
    ctx: &engine::Context,
    cwd: &Path,
    hook_args: &HookArgs,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    if let Some(reason) = blocked_reason(hook_args.verb()) {
        output::print(out, reason);
        return Ok(ExitCode::FAILURE);
    }
    if !decide(cwd, hook_args).needs_service() {
        debug!(verb = hook_args.verb(), "no lock needed");
        return Ok(ExitCode::SUCCESS);
    }

    let (enlistment, config) = match load_config(cwd) {
        Ok(loaded) => loaded,
        Err(e) => {
            output::print(out, e);
            return Ok(ExitCode::FAILURE);
        }
    };

    match runner(ctx, cwd, enlistment.as_ref(), &config).pre_command(hook_args, out) {
        Ok(outcome) => {
            debug!(?outcome, "pre-command finished");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            output::print(out, &e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn post_command(
    ctx: &engine::Context,
    cwd: &Path,
    hook_args: &HookArgs,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let (enlistment, config) = match load_config(cwd) {
        Ok(loaded) => loaded,
        Err(e) => {
            if decide(cwd, hook_args) == LockDecision::RequiresLock {
                warn!(error = %e, "using default configuration");
                output::warn(out, &e);
            } else {
                debug!(error = %e, "using default configuration");
            }
            (EnlistmentPaths::discover(cwd).ok(), Config::default())
        }
    };

    let outcome = runner(ctx, cwd, enlistment.as_ref(), &config).post_command(hook_args, out);
    debug!(?outcome, "post-command finished");
    Ok(ExitCode::SUCCESS)
}

/// Classify without any configuration, so a broken config file never
/// affects commands that do not need the service.
fn decide(cwd: &Path, hook_args: &HookArgs) -> LockDecision {
    Classifier::new(ProcessEnv, GitAliases::new(cwd))
        .classify(hook_args.verb(), hook_args.verb_args())
}

fn load_config(
    cwd: &Path,
) -> std::result::Result<(Option<EnlistmentPaths>, Config), engine::HookError> {
    let enlistment = EnlistmentPaths::discover(cwd).ok();
    let config = Config::load(enlistment.as_ref())?;
    Ok((enlistment, config))
}

fn runner(
    ctx: &engine::Context,
    cwd: &Path,
    enlistment: Option<&EnlistmentPaths>,
    config: &Config,
) -> HookRunner<PipeConnector, SystemProcesses, GitAliases, ProcessEnv> {
    if let Some(enlistment) = enlistment {
        debug!(root = %enlistment.root.display(), "found enlistment");
    }
    let connector = PipeConnector::new(config.pipe_path(), PathBuf::from(cwd));

    HookRunner::new(
        connector,
        SystemProcesses,
        GitAliases::new(cwd),
        ProcessEnv,
        HookSettings::from_config(config, ctx.interactive),
    )
}

//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags go before the hook name:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//!
//! Everything after the hook name belongs to git and is passed through
//! untouched, including arguments that look like flags.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Git pre/post-command hooks for GVFS enlistments
#[derive(Parser, Debug)]
#[command(name = "gvfs-hooks")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if the hook was started in this directory
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: HookCommand,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// The hook git is running.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum HookCommand {
    /// Run before a git command; acquires the GVFS lock when needed
    #[command(name = "pre-command", disable_help_flag = true)]
    PreCommand {
        /// Git verb and arguments, including --git-pid=<pid>
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        git_args: Vec<String>,
    },

    /// Run after a git command; releases the GVFS lock
    #[command(name = "post-command", disable_help_flag = true)]
    PostCommand {
        /// Git verb and arguments, including --git-pid=<pid> and --exit_code=<n>
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        git_args: Vec<String>,
    },
}

impl HookCommand {
    pub fn git_args(&self) -> &[String] {
        match self {
            HookCommand::PreCommand { git_args } | HookCommand::PostCommand { git_args } => {
                git_args
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Cli {
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn git_flags_pass_through() {
        let cli = parse(&[
            "gvfs-hooks",
            "pre-command",
            "commit",
            "-m",
            "msg",
            "--debug",
            "-h",
            "--git-pid=12",
        ]);
        assert!(!cli.debug);
        assert_eq!(
            cli.command,
            HookCommand::PreCommand {
                git_args: ["commit", "-m", "msg", "--debug", "-h", "--git-pid=12"]
                    .map(String::from)
                    .to_vec(),
            }
        );
    }

    #[test]
    fn global_flags_before_hook_name() {
        let cli = parse(&[
            "gvfs-hooks",
            "--debug",
            "--cwd",
            "/repo",
            "post-command",
            "checkout",
            "--git-pid=3",
            "--exit_code=0",
        ]);
        assert!(cli.debug);
        assert_eq!(cli.cwd, Some(PathBuf::from("/repo")));
        assert_eq!(cli.command.git_args().len(), 3);
    }

    #[test]
    fn empty_git_args_parse() {
        let cli = parse(&["gvfs-hooks", "post-command"]);
        assert!(cli.command.git_args().is_empty());
    }

    #[test]
    fn unknown_hook_rejected() {
        assert!(Cli::try_parse_from(["gvfs-hooks", "mid-command"]).is_err());
    }
}

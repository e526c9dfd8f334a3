//! GVFS hooks - git pre/post-command hooks for virtualized enlistments
//!
//! Git runs these hooks around every command in a GVFS enlistment. Commands
//! that can change the working tree must hold a lock owned by the GVFS
//! service while it reconciles placeholder files and the index; read-only
//! commands must never wait for it.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Classification, lock client, pre/post-command flows
//! - [`protocol`] - Wire codec for lock requests and responses
//! - [`transport`] - Channel to the service
//! - [`git`] - Git alias lookup through libgit2
//! - [`core`] - Hook arguments, configuration, enlistment paths, process queries
//! - [`ui`] - Output helpers and progress spinner
//!
//! # Correctness Invariants
//!
//! 1. Every command that can mutate the working tree takes the lock first
//! 2. Read-only commands never contact the service
//! 3. Malformed service responses are errors, never panics
//! 4. The post-command hook never changes git's exit status

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod protocol;
pub mod transport;
pub mod ui;

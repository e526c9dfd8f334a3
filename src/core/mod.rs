//! core
//!
//! Hook-independent building blocks.
//!
//! # Modules
//!
//! - [`args`] - The git invocation a hook was started for
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Enlistment discovery and storage layout
//! - [`process`] - Liveness and elevation queries
//!
//! # Design Principles
//!
//! - Nothing here talks to the service
//! - Operating-system queries sit behind traits so callers can substitute them

pub mod args;
pub mod config;
pub mod paths;
pub mod process;

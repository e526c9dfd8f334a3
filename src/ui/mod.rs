//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Message helpers and list formatting
//! - [`progress`] - Spinner shown while waiting for the lock
//!
//! # Design
//!
//! Everything here writes to a caller-supplied writer. Whether a spinner is
//! shown at all is decided by the caller from the interactive/unattended
//! state; this module only renders.

pub mod output;
pub mod progress;

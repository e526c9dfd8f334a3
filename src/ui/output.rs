//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Git shows whatever a hook prints on stdout, so user-facing messages go
//! to a caller-supplied writer (stdout in the binary, a buffer in tests).
//! Diagnostics go through `tracing` to stderr instead. Write failures are
//! ignored: a closed stdout must not change the hook's exit code.

use std::fmt::Display;
use std::io::Write;

/// Print a message line.
pub fn print(out: &mut dyn Write, message: impl Display) {
    let _ = writeln!(out, "{}", message);
}

/// Print a warning line.
pub fn warn(out: &mut dyn Write, message: impl Display) {
    let _ = writeln!(out, "warning: {}", message);
}

/// Print an error line.
pub fn error(out: &mut dyn Write, message: impl Display) {
    let _ = writeln!(out, "error: {}", message);
}

/// Format a list of items, one per line, each with `prefix`.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

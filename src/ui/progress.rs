//! ui::progress
//!
//! Feedback while a hook blocks on the service.
//!
//! # Design
//!
//! The lock client's retry loop is synchronous. Instead of a spinner thread
//! it calls [`Progress::waiting`] once per retry, and the spinner advances
//! one frame per call. Unattended sessions get [`NoProgress`] and run the
//! same loop silently.
//!
//! # Example
//!
//! ```
//! use gvfs_hooks::ui::progress::{Progress, Spinner};
//!
//! let mut out = Vec::new();
//! let mut spinner = Spinner::new(&mut out);
//! spinner.waiting("Waiting for 'git pull' to release the lock");
//! spinner.waiting("Waiting for 'git pull' to release the lock");
//! spinner.finish(true);
//! drop(spinner);
//!
//! let text = String::from_utf8(out).unwrap();
//! assert!(text.ends_with("Succeeded\n"));
//! ```

use std::io::Write;

/// Spinner frames, in display order.
const FRAMES: [char; 4] = ['|', '/', '-', '\\'];

/// Receives progress from a blocking wait.
pub trait Progress {
    /// Called once per retry while the wait continues.
    fn waiting(&mut self, reason: &str);

    /// Called once when the wait ends, whether or not it ever waited.
    fn finish(&mut self, succeeded: bool);
}

/// Progress sink that renders nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn waiting(&mut self, _reason: &str) {}

    fn finish(&mut self, _succeeded: bool) {}
}

/// Single-line text spinner.
///
/// Output errors are ignored: a broken terminal must not fail the hook.
#[derive(Debug)]
pub struct Spinner<W: Write> {
    out: W,
    reason: Option<String>,
    frame: usize,
}

impl<W: Write> Spinner<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            reason: None,
            frame: 0,
        }
    }

    fn draw(&mut self) {
        if let Some(reason) = &self.reason {
            let frame = FRAMES[self.frame % FRAMES.len()];
            let _ = write!(self.out, "\r{reason}...{frame}");
            let _ = self.out.flush();
        }
    }
}

impl<W: Write> Progress for Spinner<W> {
    fn waiting(&mut self, reason: &str) {
        if self.reason.as_deref() != Some(reason) {
            if self.reason.is_some() {
                let _ = writeln!(self.out);
            }
            self.reason = Some(reason.to_string());
            self.frame = 0;
        } else {
            self.frame += 1;
        }
        self.draw();
    }

    fn finish(&mut self, succeeded: bool) {
        if let Some(reason) = self.reason.take() {
            let status = if succeeded { "Succeeded" } else { "Failed" };
            let _ = writeln!(self.out, "\r{reason}...{status}");
            let _ = self.out.flush();
        }
    }
}

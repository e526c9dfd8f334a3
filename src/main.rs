//! gvfs-hooks binary entry point.

use std::io;
use std::process::ExitCode;

use gvfs_hooks::ui::output;

fn main() -> ExitCode {
    match gvfs_hooks::cli::run() {
        Ok(code) => code,
        Err(e) => {
            output::error(&mut io::stdout(), format_args!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

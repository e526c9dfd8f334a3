//! core::process
//!
//! Queries about the process that triggered the hook.
//!
//! The hook does not enumerate processes itself; it only needs to know
//! whether the git process that started it is still running and whether
//! the hook is running elevated. Both are behind [`ProcessInspector`] so the
//! orchestrator can be tested without real pids.

/// Process queries used by the hook orchestrator.
pub trait ProcessInspector {
    /// Whether a process with this pid currently exists.
    fn is_running(&self, pid: u32) -> bool;

    /// Whether the current process runs with administrator rights.
    fn is_elevated(&self) -> bool;
}

/// [`ProcessInspector`] backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcesses;

impl ProcessInspector for SystemProcesses {
    #[cfg(unix)]
    fn is_running(&self, pid: u32) -> bool {
        // pid 0 and negative pids address process groups.
        let Ok(pid) = libc::pid_t::try_from(pid) else {
            return false;
        };
        if pid <= 0 {
            return false;
        }

        // SAFETY: signal 0 performs the permission and existence checks only.
        let rc = unsafe { libc::kill(pid, 0) };
        if rc == 0 {
            return true;
        }
        // EPERM: the process exists but belongs to someone else.
        matches!(
            std::io::Error::last_os_error().raw_os_error(),
            Some(code) if code == libc::EPERM
        )
    }

    #[cfg(not(unix))]
    fn is_running(&self, pid: u32) -> bool {
        pid != 0
    }

    #[cfg(unix)]
    fn is_elevated(&self) -> bool {
        // SAFETY: geteuid has no preconditions and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(not(unix))]
    fn is_elevated(&self) -> bool {
        false
    }
}

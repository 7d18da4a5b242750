//! Process signaling boundary

use crate::error::{SignalError, SignalResult};

/// Signals and liveness checks against host processes
pub trait ProcessControl {
    /// Send the graceful termination signal (SIGTERM)
    fn terminate(&self, pid: u32) -> SignalResult;

    /// Send the forceful, unmaskable kill signal (SIGKILL)
    fn kill(&self, pid: u32) -> SignalResult;

    /// Whether the pid still refers to a live process
    fn is_alive(&self, pid: u32) -> bool;
}

/// [`ProcessControl`] backed by `kill(2)`
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixProcessControl;

impl UnixProcessControl {
    fn signal(pid: u32, signal: libc::c_int) -> SignalResult {
        // pid 0 and negative values address process groups, never a single process
        let target = match libc::pid_t::try_from(pid) {
            Ok(target) if target > 0 => target,
            _ => return Err(SignalError::InvalidPid(pid)),
        };

        let rc = unsafe { libc::kill(target, signal) };
        if rc == 0 {
            Ok(())
        } else {
            Err(SignalError::from_io(std::io::Error::last_os_error()))
        }
    }
}

impl ProcessControl for UnixProcessControl {
    fn terminate(&self, pid: u32) -> SignalResult {
        Self::signal(pid, libc::SIGTERM)
    }

    fn kill(&self, pid: u32) -> SignalResult {
        Self::signal(pid, libc::SIGKILL)
    }

    fn is_alive(&self, pid: u32) -> bool {
        // Signal 0 only checks existence; EPERM still means the process exists
        match Self::signal(pid, 0) {
            Ok(()) => true,
            Err(SignalError::PermissionDenied) => true,
            Err(_) => false,
        }
    }
}

/// Whether the daemon runs with root privileges
pub fn running_as_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

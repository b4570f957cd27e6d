//! PID file helpers
//!
//! The PID file is written and removed by the server itself. Every operation
//! here is best-effort: a missing file, a garbage PID or a dead process all
//! mean "already stopped".

use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

/// Read a positive PID from `pid_file`
pub fn read_pid(pid_file: &Path) -> Option<Pid> {
    let content = fs::read_to_string(pid_file).ok()?;
    let pid = content.trim().parse::<i32>().ok()?;

    // 0 and negative values address process groups
    if pid <= 0 {
        return None;
    }

    Some(Pid::from_raw(pid))
}

/// Send SIGTERM to the process named by `pid_file`.
///
/// Returns whether a process was found and signaled.
pub fn kill_by_pid_file(pid_file: &Path) -> bool {
    let Some(pid) = read_pid(pid_file) else {
        debug!("No usable PID in {}", pid_file.display());
        return false;
    };

    match kill(pid, Signal::SIGTERM) {
        Ok(()) => {
            info!("Sent SIGTERM to server (PID {})", pid);
            true
        }
        Err(Errno::ESRCH) => {
            debug!("Server process {} is already gone", pid);
            false
        }
        Err(e) => {
            warn!("Failed to signal server process {}: {}", pid, e);
            false
        }
    }
}

/// Check whether the process named by `pid_file` is alive
pub fn is_running(pid_file: &Path) -> bool {
    match read_pid(pid_file) {
        // EPERM: the process exists but belongs to someone else
        Some(pid) => matches!(kill(pid, None::<Signal>), Ok(()) | Err(Errno::EPERM)),
        None => false,
    }
}

//! External web server abstraction
//!
//! The supervisor only needs a handful of capabilities from "the server":
//! locating its binary, building a foreground invocation, running it to
//! completion, and stopping it through its PID file. `Lighttpd` is the one
//! implementation today.

pub mod lighttpd;
pub mod pid;

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use crate::constants::EXECUTABLE_FALLBACK_DIRS;
use crate::models::{Invocation, LightspawnError};

pub use lighttpd::Lighttpd;

pub trait Server: Send + Sync {
    /// Name of the server binary, used in messages
    fn name(&self) -> &str;

    /// Locate the server binary, honoring an explicit override
    fn resolve_executable(&self) -> Result<PathBuf, LightspawnError>;

    /// Arguments that run the server in the foreground with `config_file`
    fn build_command(&self, executable: &Path, config_file: &Path) -> Invocation;

    /// Run the server until it exits. Blocks the calling thread.
    fn start(&self, invocation: &Invocation, working_dir: &Path) -> Result<ExitStatus, LightspawnError> {
        Ok(invocation.to_command(working_dir).status()?)
    }

    /// Best-effort SIGTERM through the PID file; `false` when nothing was signaled
    fn kill_by_pid_file(&self, pid_file: &Path) -> bool {
        pid::kill_by_pid_file(pid_file)
    }

    fn is_running(&self, pid_file: &Path) -> bool {
        pid::is_running(pid_file)
    }
}

/// Look `name` up on PATH, then in the usual sbin directories
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok().or_else(|| {
        EXECUTABLE_FALLBACK_DIRS
            .iter()
            .map(|dir| Path::new(dir).join(name))
            .find(|candidate| candidate.is_file())
    })
}

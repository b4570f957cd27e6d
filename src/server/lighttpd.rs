//! lighttpd server variant

use std::path::{Path, PathBuf};

use log::debug;

use super::{find_executable, Server};
use crate::constants::SERVER_BINARY;
use crate::models::{Invocation, LightspawnError};

/// lighttpd run in the foreground (`-D`) with a generated configuration
#[derive(Debug, Clone, Default)]
pub struct Lighttpd {
    /// Explicit command, skips the PATH lookup
    command: Option<PathBuf>,
}

impl Lighttpd {
    pub fn new(command: Option<PathBuf>) -> Self {
        Self { command }
    }
}

impl Server for Lighttpd {
    fn name(&self) -> &str {
        SERVER_BINARY
    }

    fn resolve_executable(&self) -> Result<PathBuf, LightspawnError> {
        if let Some(ref command) = self.command {
            return Ok(command.clone());
        }

        let executable = find_executable(SERVER_BINARY)
            .ok_or_else(|| LightspawnError::ExecutableNotFound(SERVER_BINARY.to_string()))?;
        debug!("Using {}", executable.display());
        Ok(executable)
    }

    fn build_command(&self, executable: &Path, config_file: &Path) -> Invocation {
        Invocation {
            program: executable.to_path_buf(),
            args: vec!["-D".into(), "-f".into(), config_file.as_os_str().to_os_string()],
        }
    }
}

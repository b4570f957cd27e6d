//! Project layout
//!
//! A project is a root directory holding the web root plus the cache and log
//! directories the server writes into. All generated paths derive from here.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::config::SpawnConfig;
use crate::constants::{
    ACCESS_LOG_FILENAME, CONFIG_FILENAME, ERROR_LOG_FILENAME, FASTCGI_SOCKET_FILENAME, PID_FILENAME,
    RESTART_MARKER_FILENAME, RULES_FILENAME, SERVER_SUBDIR,
};
use crate::models::LightspawnError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    root_dir: PathBuf,
    web_dir: PathBuf,
    cache_dir: PathBuf,
    log_dir: PathBuf,
}

impl Project {
    /// Open a project, checking that its root and web root exist
    pub fn open(root_dir: &Path, web_dir: &Path, cache_dir: &Path, log_dir: &Path) -> Result<Self, LightspawnError> {
        if !root_dir.is_dir() {
            return Err(LightspawnError::NotFound {
                what: "Project directory",
                path: root_dir.to_path_buf(),
            });
        }
        if !web_dir.is_dir() {
            return Err(LightspawnError::NotFound {
                what: "Web directory",
                path: web_dir.to_path_buf(),
            });
        }

        Ok(Self {
            root_dir: root_dir.canonicalize()?,
            web_dir: web_dir.canonicalize()?,
            cache_dir: cache_dir.to_path_buf(),
            log_dir: log_dir.to_path_buf(),
        })
    }

    pub fn from_config(config: &SpawnConfig) -> Result<Self, LightspawnError> {
        Self::open(&config.project_root, &config.web_dir, &config.cache_dir, &config.log_dir)
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn web_dir(&self) -> &Path {
        &self.web_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// `cache/lighttpd`, the only directory cleared on rotation
    pub fn server_cache_dir(&self) -> PathBuf {
        self.cache_dir.join(SERVER_SUBDIR)
    }

    pub fn server_log_dir(&self) -> PathBuf {
        self.log_dir.join(SERVER_SUBDIR)
    }

    pub fn config_file(&self) -> PathBuf {
        self.server_cache_dir().join(CONFIG_FILENAME)
    }

    pub fn rules_file(&self) -> PathBuf {
        self.server_cache_dir().join(RULES_FILENAME)
    }

    // Outside cache/lighttpd so a rotation never loses track of a running server
    pub fn pid_file(&self) -> PathBuf {
        self.cache_dir.join(PID_FILENAME)
    }

    pub fn restart_marker(&self) -> PathBuf {
        self.cache_dir.join(RESTART_MARKER_FILENAME)
    }

    pub fn error_log(&self) -> PathBuf {
        self.server_log_dir().join(ERROR_LOG_FILENAME)
    }

    pub fn access_log(&self) -> PathBuf {
        self.server_log_dir().join(ACCESS_LOG_FILENAME)
    }

    pub fn fastcgi_socket(&self) -> PathBuf {
        self.server_cache_dir().join(FASTCGI_SOCKET_FILENAME)
    }

    /// Recreate the cache and log directories.
    ///
    /// With `clear`, the server cache directory is emptied first. Logs and the
    /// PID file are kept.
    pub fn rotate(&self, clear: bool) -> io::Result<()> {
        let server_cache = self.server_cache_dir();
        if clear && server_cache.exists() {
            debug!("Clearing {}", server_cache.display());
            fs::remove_dir_all(&server_cache)?;
        }

        fs::create_dir_all(&server_cache)?;
        fs::create_dir_all(self.server_log_dir())?;
        Ok(())
    }
}

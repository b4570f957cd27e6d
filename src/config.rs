//! Configuration management
//!
//! Handles the optional `lightspawn.toml` project file (parsing, validation)
//! and merges it with the command-line flags into the `SpawnConfig` that
//! every component receives explicitly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::CliArgs;
use crate::constants::{
    DEFAULT_APP, DEFAULT_BIND, DEFAULT_CACHE_DIR, DEFAULT_LOG_DIR, DEFAULT_NOPHP, DEFAULT_PORT,
    DEFAULT_WEB_DIR, POLLING_INTERVAL_DEFAULT, POLLING_INTERVAL_MAX, POLLING_INTERVAL_MIN,
    PROJECT_CONFIG_FILENAME,
};
use crate::models::{LightspawnError, ScanOptions};

/// Project configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfiguration {
    pub server: ServerSettings,
    pub project: ProjectSettings,
    pub supervisor: SupervisorSettings,
}

/// Server settings, each one overridable from the command line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    /// Explicit lighttpd binary, skips the PATH lookup
    pub lighttpd_cmd: Option<PathBuf>,
    /// PHP FastCGI binary
    pub php_cgi_cmd: Option<String>,
    pub port: Option<u16>,
    pub bind: Option<String>,
}

/// Project layout and exposure policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectSettings {
    /// Web root, relative to the project root
    pub web_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Readable directories in the web root, in addition to the scanned ones
    pub readable_dirs: Vec<String>,
    /// Readable files in the web root (robots.txt)
    pub readable_files: Vec<String>,
    /// Executable scripts in the web root (index.php)
    pub readable_phpfiles: Vec<String>,
    /// No scripts other than the configured ones or the default entry point
    pub restrict: bool,
    /// Directories of the web root where PHP execution is denied
    pub nophp: Option<Vec<String>>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            web_dir: PathBuf::from(DEFAULT_WEB_DIR),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            readable_dirs: Vec::new(),
            readable_files: Vec::new(),
            readable_phpfiles: Vec::new(),
            restrict: false,
            nophp: None,
        }
    }
}

/// Supervisor timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SupervisorSettings {
    /// Polling interval in seconds (0.1-300.0), also used as the debounce delay
    pub polling_interval: f64,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            polling_interval: POLLING_INTERVAL_DEFAULT,
        }
    }
}

impl ProjectConfiguration {
    /// Load and validate a configuration file
    pub fn load_from_file(path: &Path) -> Result<Self, LightspawnError> {
        if !path.exists() {
            return Err(LightspawnError::NotFound {
                what: "Configuration file",
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            LightspawnError::InvalidConfig(format!("{}: {}", path.display(), e.message()))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load `lightspawn.toml` from the project root, or the defaults when absent
    pub fn discover(project_root: &Path) -> Result<Self, LightspawnError> {
        let path = Self::default_config_path(project_root);
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn default_config_path(project_root: &Path) -> PathBuf {
        project_root.join(PROJECT_CONFIG_FILENAME)
    }

    pub fn validate(&self) -> Result<(), LightspawnError> {
        let interval = self.supervisor.polling_interval;
        if !(POLLING_INTERVAL_MIN..=POLLING_INTERVAL_MAX).contains(&interval) {
            return Err(LightspawnError::InvalidInterval(interval));
        }
        if self.server.port == Some(0) {
            return Err(LightspawnError::InvalidConfig("server.port must not be 0".to_string()));
        }
        Ok(())
    }

    pub fn polling_duration(&self) -> Duration {
        Duration::from_secs_f64(self.supervisor.polling_interval)
    }
}

/// How the invocation should run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Watch the web root and restart the server on changes
    Supervised,
    /// Run the server once in the foreground
    SingleProcess,
    /// Stop a server started earlier for this project
    Kill,
}

/// Fully resolved settings for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnConfig {
    pub project_root: PathBuf,
    pub web_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub log_dir: PathBuf,
    pub port: u16,
    /// `None` binds every interface
    pub bind: Option<String>,
    pub scan: ScanOptions,
    pub lighttpd_cmd: Option<PathBuf>,
    pub php_cgi_cmd: Option<String>,
    pub polling_interval: Duration,
    pub tail: bool,
    pub mode: RunMode,
}

impl SpawnConfig {
    /// Merge command-line flags over the project configuration.
    ///
    /// Relative paths are resolved against `cwd` (flags) or the project root
    /// (configuration file).
    pub fn resolve(cli: &CliArgs, file: &ProjectConfiguration, cwd: &Path) -> Result<Self, LightspawnError> {
        file.validate()?;

        let project_root = cwd.to_path_buf();
        let web_dir = match cli.path {
            Some(ref path) => absolute(cwd, path),
            None => absolute(&project_root, &file.project.web_dir),
        };

        let bind = if cli.all {
            None
        } else {
            Some(
                cli.bind
                    .clone()
                    .or_else(|| file.server.bind.clone())
                    .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            )
        };

        let nophp = cli
            .nophp
            .clone()
            .or_else(|| file.project.nophp.clone())
            .unwrap_or_else(|| vec![DEFAULT_NOPHP.to_string()]);

        let scan = ScanOptions {
            default_entry: cli.default_app.clone().unwrap_or_else(|| DEFAULT_APP.to_string()),
            allow_list: cli.allow.clone(),
            deny_list: nophp,
            restrict: cli.only || file.project.restrict,
            seed_dirs: file.project.readable_dirs.clone(),
            seed_files: file.project.readable_files.clone(),
            seed_scripts: file.project.readable_phpfiles.clone(),
        };

        let mode = if cli.kill {
            RunMode::Kill
        } else if cli.single_process {
            RunMode::SingleProcess
        } else {
            RunMode::Supervised
        };

        let port = cli.port.or(file.server.port).unwrap_or(DEFAULT_PORT);
        if port == 0 {
            return Err(LightspawnError::InvalidConfig("port must not be 0".to_string()));
        }

        Ok(Self {
            web_dir,
            cache_dir: absolute(&project_root, &file.project.cache_dir),
            log_dir: absolute(&project_root, &file.project.log_dir),
            project_root,
            port,
            bind,
            scan,
            lighttpd_cmd: cli.lighttpd_cmd.clone().or_else(|| file.server.lighttpd_cmd.clone()),
            php_cgi_cmd: cli.php_cgi_cmd.clone().or_else(|| file.server.php_cgi_cmd.clone()),
            polling_interval: file.polling_duration(),
            tail: cli.tail,
            mode,
        })
    }
}

fn absolute(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

//! Data models module
//!
//! Defines core data structures:
//! - ScanOptions / ScanResult: web root classification
//! - RuleSet: canonical description of what the web root exposes
//! - ServerOptions: static server settings rendered into lighttpd.conf
//! - ConfigSnapshot: rendered text, the change-detection unit
//! - ServerHandle: paths and invocation owned by the running server

use serde::Serialize;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Policy applied when classifying the entries of a web root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Application served when no script matches (without the `.php` extension)
    pub default_entry: String,
    /// Applications allowed to execute in restricted mode; glob patterns match existing scripts
    pub allow_list: Vec<String>,
    /// Path prefixes in which PHP execution is denied
    pub deny_list: Vec<String>,
    /// Only the default entry point and allow-listed scripts are executable
    pub restrict: bool,
    /// Configured readable directories, kept when they exist in the web root
    pub seed_dirs: Vec<String>,
    /// Configured readable files, kept when they exist in the web root
    pub seed_files: Vec<String>,
    /// Configured executable scripts, kept when they exist in the web root
    pub seed_scripts: Vec<String>,
}

impl ScanOptions {
    /// Script name of the default entry point (`index` -> `index.php`)
    pub fn default_script(&self) -> String {
        script_name(&self.default_entry)
    }
}

/// Appends the script extension unless the name already carries it
pub fn script_name(app: &str) -> String {
    if app.ends_with(crate::constants::SCRIPT_EXTENSION) {
        app.to_string()
    } else {
        format!("{}{}", app, crate::constants::SCRIPT_EXTENSION)
    }
}

/// Classified top-level entries of a web root, as file names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub dirs: BTreeSet<String>,
    pub files: BTreeSet<String>,
    pub scripts: BTreeSet<String>,
}

/// Rewrite rule description of a web root.
///
/// Serializes with the parameter names of the rules template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSet {
    #[serde(rename = "default")]
    default_entry_point: String,
    #[serde(rename = "nophp")]
    denied_php_paths: BTreeSet<String>,
    #[serde(rename = "phps")]
    allowed_scripts: BTreeSet<String>,
    #[serde(rename = "dirs")]
    readable_dirs: BTreeSet<String>,
    #[serde(rename = "files")]
    readable_files: BTreeSet<String>,
}

impl RuleSet {
    pub fn new(
        default_entry_point: String,
        denied_php_paths: BTreeSet<String>,
        mut allowed_scripts: BTreeSet<String>,
        readable_dirs: BTreeSet<String>,
        readable_files: BTreeSet<String>,
    ) -> Self {
        allowed_scripts.insert(default_entry_point.clone());
        Self {
            default_entry_point,
            denied_php_paths,
            allowed_scripts,
            readable_dirs,
            readable_files,
        }
    }

    pub fn default_entry_point(&self) -> &str {
        &self.default_entry_point
    }

    pub fn denied_php_paths(&self) -> &BTreeSet<String> {
        &self.denied_php_paths
    }

    pub fn allowed_scripts(&self) -> &BTreeSet<String> {
        &self.allowed_scripts
    }

    pub fn readable_dirs(&self) -> &BTreeSet<String> {
        &self.readable_dirs
    }

    pub fn readable_files(&self) -> &BTreeSet<String> {
        &self.readable_files
    }
}

/// Static server settings.
///
/// Serializes with the parameter names of the main configuration template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerOptions {
    pub document_root: PathBuf,
    pub port: u16,
    /// `None` binds every interface
    pub bind: Option<String>,
    pub error_log: PathBuf,
    pub access_log: PathBuf,
    #[serde(rename = "pidfile")]
    pub pid_file: PathBuf,
    pub rules_file: Option<PathBuf>,
    pub php_cgi_cmd: String,
    pub fastcgi_socket: PathBuf,
}

/// Rendered configuration and rules text
#[derive(Debug, Clone, Eq)]
pub struct ConfigSnapshot {
    pub config_text: String,
    pub rules_text: String,
}

impl ConfigSnapshot {
    pub fn new(config_text: String, rules_text: String) -> Self {
        Self {
            config_text,
            rules_text,
        }
    }

    /// Concatenated text used as the change-detection key
    pub fn read(&self) -> String {
        format!("{}\n{}", self.config_text, self.rules_text)
    }
}

impl PartialEq for ConfigSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.read() == other.read()
    }
}

/// Program and arguments used to run the external server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Invocation {
    /// Build a blocking command rooted at `working_dir`
    pub fn to_command(&self, working_dir: &Path) -> std::process::Command {
        let mut command = std::process::Command::new(&self.program);
        command.args(&self.args).current_dir(working_dir);
        command
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Everything the supervisor needs to run and stop one server
#[derive(Debug, Clone)]
pub struct ServerHandle {
    pub pid_file: PathBuf,
    pub config_file: PathBuf,
    pub rules_file: PathBuf,
    pub command: Invocation,
    pub working_dir: PathBuf,
}

/// Error taxonomy shared by every component
#[derive(Debug, thiserror::Error)]
pub enum LightspawnError {
    #[error("{what} not found: {}", path.display())]
    NotFound { what: &'static str, path: PathBuf },

    #[error("{0} executable not found, set an explicit command to override")]
    ExecutableNotFound(String),

    #[error("Failed to render {template}")]
    Render {
        template: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Note: bounds must match POLLING_INTERVAL_MIN/MAX in constants.rs
    #[error("Invalid polling interval: {0}. Must be between 0.1 and 300.0 seconds")]
    InvalidInterval(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

//! Global constants for lightspawn
//!
//! Centralized location for application-wide constants

/// Application name, used in the version banner and log events
pub const APP_NAME: &str = "lightspawn";

/// Name of the external web server binary
pub const SERVER_BINARY: &str = "lighttpd";

/// Name of the PHP FastCGI binary looked up when none is configured
pub const PHP_CGI_BINARY: &str = "php-cgi";

/// Directories searched for executables that are commonly missing from a user's PATH
pub const EXECUTABLE_FALLBACK_DIRS: &[&str] = &[
    "/usr/sbin",
    "/usr/local/sbin",
    "/sbin",
    "/opt/homebrew/bin",
];

/// Optional per-project configuration file, looked up in the project root
pub const PROJECT_CONFIG_FILENAME: &str = "lightspawn.toml";

/// Rendered lighttpd configuration file name
pub const CONFIG_FILENAME: &str = "lighttpd.conf";

/// Rendered rewrite rules file name
pub const RULES_FILENAME: &str = "rules.conf";

/// Sub-directory of the project cache and log directories owned by the server
pub const SERVER_SUBDIR: &str = "lighttpd";

/// PID file written by lighttpd, relative to the project cache directory
pub const PID_FILENAME: &str = ".lightspawn.pid";

/// Restart marker, relative to the project cache directory
pub const RESTART_MARKER_FILENAME: &str = ".lightspawn_restart";

/// FastCGI socket prefix, relative to the server cache directory
pub const FASTCGI_SOCKET_FILENAME: &str = "php-fastcgi.socket";

pub const ERROR_LOG_FILENAME: &str = "error.log";
pub const ACCESS_LOG_FILENAME: &str = "access.log";

/// Extension of executable scripts in the web root
pub const SCRIPT_EXTENSION: &str = ".php";

/// Entries starting with this character are never exposed
pub const HIDDEN_PREFIX: char = '.';

pub const DEFAULT_PORT: u16 = 4042;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_APP: &str = "index";
pub const DEFAULT_NOPHP: &str = "uploads";
pub const DEFAULT_WEB_DIR: &str = "web";
pub const DEFAULT_CACHE_DIR: &str = "cache";
pub const DEFAULT_LOG_DIR: &str = "log";

/// Polling interval bounds in seconds. The debounce delay always equals the polling interval.
pub const POLLING_INTERVAL_DEFAULT: f64 = 1.0;
pub const POLLING_INTERVAL_MIN: f64 = 0.1;
pub const POLLING_INTERVAL_MAX: f64 = 300.0;

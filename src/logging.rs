//! Logging setup and structured supervisor events
//!
//! Console logging goes through `env_logger` (stderr, honoring `RUST_LOG`).
//! Supervisor lifecycle events are emitted as `message | {json}` lines so they
//! can be grepped and parsed alike.

use std::path::Path;

use log::{error, info, warn, LevelFilter};
use serde_json::json;

use crate::constants::APP_NAME;

/// Initialize the global logger.
///
/// `verbosity` counts `-v` flags: 0 warn, 1 info, 2 debug, 3+ trace.
/// `RUST_LOG` takes precedence when set.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format_timestamp_millis();
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }

    // A second init (tests) keeps the first logger
    let _ = builder.try_init();
}

/// Structured event logger for the restart supervisor
#[derive(Debug, Clone)]
pub struct SupervisorLogger {
    project: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogLevel {
    Error,
    Warn,
    Info,
}

impl SupervisorLogger {
    pub fn new(project_root: &Path) -> Self {
        Self {
            project: project_root.display().to_string(),
        }
    }

    /// Log supervisor startup
    pub fn log_startup(&self, command: &str, interval_secs: f64) {
        let data = json!({
            "event": "supervisor_startup",
            "project": self.project,
            "pid": std::process::id(),
            "command": command,
            "polling_interval": interval_secs,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        self.log_structured(LogLevel::Info, &format!("{} supervisor started", APP_NAME), &data);
    }

    /// Log a detected web root change
    pub fn log_snapshot_change(&self) {
        let data = json!({
            "event": "snapshot_changed",
            "project": self.project,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        self.log_structured(LogLevel::Warn, "Web directory changed", &data);
    }

    /// Log a requested restart
    pub fn log_restart(&self, signaled: bool) {
        let data = json!({
            "event": "restart_requested",
            "project": self.project,
            "signaled": signaled,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        self.log_structured(LogLevel::Info, "Restart requested", &data);
    }

    /// Log the final exit of the server
    pub fn log_termination(&self, code: Option<i32>) {
        let data = json!({
            "event": "server_terminated",
            "project": self.project,
            "exit_code": code,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        self.log_structured(LogLevel::Info, "Server terminated", &data);
    }

    /// Log error events
    pub fn log_error(&self, error_message: &str, context: Option<&str>) {
        let data = json!({
            "event": "error",
            "project": self.project,
            "message": error_message,
            "context": context,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        self.log_structured(LogLevel::Error, error_message, &data);
    }

    fn log_structured(&self, level: LogLevel, message: &str, data: &serde_json::Value) {
        let full_message = format_structured(message, data);

        match level {
            LogLevel::Error => error!("{}", full_message),
            LogLevel::Warn => warn!("{}", full_message),
            LogLevel::Info => info!("{}", full_message),
        }
    }
}

fn format_structured(message: &str, data: &serde_json::Value) -> String {
    format!("{} | {}", message, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_format_is_parseable() {
        let data = json!({"event": "restart_requested", "signaled": true});
        let line = format_structured("Restart requested", &data);

        let (message, payload) = line.split_once(" | ").unwrap();
        assert_eq!(message, "Restart requested");

        let parsed: serde_json::Value = serde_json::from_str(payload).unwrap();
        assert_eq!(parsed["event"], "restart_requested");
        assert_eq!(parsed["signaled"], true);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(0);
        init(3);
    }

    #[test]
    fn test_logger_methods_do_not_panic() {
        let logger = SupervisorLogger::new(Path::new("/srv/app"));
        logger.log_startup("/usr/sbin/lighttpd -D -f lighttpd.conf", 1.0);
        logger.log_snapshot_change();
        logger.log_restart(false);
        logger.log_termination(Some(0));
        logger.log_error("Failed to regenerate rules", Some("watcher"));
    }
}

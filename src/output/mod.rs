//! Output formatting module
//!
//! Handles:
//! - Version line and startup banner
//! - Application URLs for every executable script
//! - Console messages for supervisor events

use std::collections::BTreeSet;

use crate::constants::{APP_NAME, SCRIPT_EXTENSION};
use crate::supervisor::SupervisorEvent;

/// Text shown for the bind address when every interface is bound
const ALL_INTERFACES: &str = "all-interfaces";

pub fn version_line() -> String {
    format!("{} {} ({})", APP_NAME, env!("LIGHTSPAWN_VERSION"), env!("GIT_HASH"))
}

pub fn print_version() {
    println!("{}", version_line());
}

/// Host to put in URLs: wildcard binds are reached through localhost
pub fn display_host(bind: Option<&str>) -> &str {
    match bind {
        None | Some("0.0.0.0") | Some("::") => "localhost",
        Some(address) => address,
    }
}

/// One URL per executable script, in name order
pub fn application_urls(host: &str, port: u16, scripts: &BTreeSet<String>) -> Vec<String> {
    scripts
        .iter()
        .filter(|script| script.len() > SCRIPT_EXTENSION.len() && script.ends_with(SCRIPT_EXTENSION))
        .map(|script| format!("http://{}:{}/{}", host, port, script))
        .collect()
}

pub fn format_banner(server_name: &str, bind: Option<&str>, port: u16, scripts: &BTreeSet<String>) -> String {
    let mut banner = format!(
        "{} started on {}, port {}.\n\nAvailable applications:\n",
        server_name,
        bind.unwrap_or(ALL_INTERFACES),
        port
    );

    for url in application_urls(display_host(bind), port, scripts) {
        banner.push_str(&format!(" {}\n", url));
    }

    banner.push_str("\nPress Ctrl+C to stop serving.\n");
    banner
}

/// Console line for a supervisor event, if it has one
pub fn format_event(event: &SupervisorEvent) -> Option<String> {
    match event {
        SupervisorEvent::SnapshotChanged => Some("Change detected in the web directory.".to_string()),
        SupervisorEvent::Restarting => Some("Something in the web directory changed. Restarting lighttpd.".to_string()),
        SupervisorEvent::Terminated { .. } => Some("Terminated.".to_string()),
        SupervisorEvent::RegenerationFailed(message) | SupervisorEvent::StartFailed(message) => {
            Some(format!("Error: {}", message))
        }
        SupervisorEvent::Started | SupervisorEvent::RestartTriggered { .. } => None,
    }
}

pub fn print_event(event: &SupervisorEvent) {
    let Some(line) = format_event(event) else {
        return;
    };

    match event {
        SupervisorEvent::RegenerationFailed(_) | SupervisorEvent::StartFailed(_) => eprintln!("{}", line),
        _ => println!("{}", line),
    }
}

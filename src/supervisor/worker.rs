//! Server worker
//!
//! Blocking loop that runs the server until it exits, then decides between a
//! restart (marker present) and termination (marker absent).

use std::sync::Arc;

use log::{info, warn};

use super::{EventSink, RestartMarker, SnapshotSource, SupervisorEvent};
use crate::logging::SupervisorLogger;
use crate::models::ServerHandle;
use crate::server::Server;

/// Why the worker stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// The server exited with no restart pending
    Terminated { code: Option<i32> },
    /// Rules could not be regenerated for a requested restart
    RegenerationFailed(String),
    /// The server could not be started
    StartFailed(String),
    /// Shutdown gave up waiting for the server
    Interrupted,
}

impl WorkerExit {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            WorkerExit::Terminated { .. } => 0,
            WorkerExit::Interrupted => 130,
            WorkerExit::RegenerationFailed(_) | WorkerExit::StartFailed(_) => 1,
        }
    }
}

pub struct Worker {
    server: Arc<dyn Server>,
    source: Arc<dyn SnapshotSource>,
    handle: ServerHandle,
    marker: RestartMarker,
    logger: SupervisorLogger,
    events: EventSink,
}

impl Worker {
    pub(crate) fn new(
        server: Arc<dyn Server>,
        source: Arc<dyn SnapshotSource>,
        handle: ServerHandle,
        marker: RestartMarker,
        logger: SupervisorLogger,
        events: EventSink,
    ) -> Self {
        Self {
            server,
            source,
            handle,
            marker,
            logger,
            events,
        }
    }

    /// Run the server until it exits without a pending restart. Blocks.
    pub fn run(&self) -> WorkerExit {
        loop {
            // A stale marker must not turn the next exit into a restart
            if let Err(e) = self.marker.consume() {
                warn!("Failed to remove {}: {}", self.marker.path().display(), e);
            }

            self.events.emit(SupervisorEvent::Started);
            let status = match self.server.start(&self.handle.command, &self.handle.working_dir) {
                Ok(status) => status,
                Err(e) => {
                    let message = format!("Failed to start {}: {:#}", self.server.name(), anyhow::Error::from(e));
                    self.logger.log_error(&message, Some("worker"));
                    self.events.emit(SupervisorEvent::StartFailed(message.clone()));
                    return WorkerExit::StartFailed(message);
                }
            };

            if !self.marker.is_pending() {
                self.logger.log_termination(status.code());
                self.events.emit(SupervisorEvent::Terminated { code: status.code() });
                return WorkerExit::Terminated { code: status.code() };
            }

            info!("Restarting {}", self.server.name());
            self.events.emit(SupervisorEvent::Restarting);

            if let Err(e) = self.source.regenerate() {
                let message = format!(
                    "Failed to regenerate {}: {:#}",
                    self.handle.rules_file.display(),
                    anyhow::Error::from(e)
                );
                self.logger.log_error(&message, Some("worker"));
                self.events.emit(SupervisorEvent::RegenerationFailed(message.clone()));
                return WorkerExit::RegenerationFailed(message);
            }
        }
    }
}

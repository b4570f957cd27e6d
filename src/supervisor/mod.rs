//! Restart supervisor
//!
//! Runs the server in a blocking worker and watches the web root from an
//! async task. The two never share memory:
//! - the watcher creates the restart marker, then kills the server through its PID file
//! - the worker removes the marker before each start, and restarts only when it finds one
//!
//! Progress is reported as `SupervisorEvent`s on an optional channel.

pub mod marker;
pub mod watcher;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, warn};
use tokio::signal;
use tokio::sync::mpsc::UnboundedSender;

use crate::logging::SupervisorLogger;
use crate::models::{ConfigSnapshot, LightspawnError, ServerHandle};
use crate::rules::ConfigGenerator;
use crate::server::Server;
use crate::tail::MultiTail;

pub use marker::RestartMarker;
pub use watcher::{SnapshotTracker, Watcher};
pub use worker::{Worker, WorkerExit};

/// How long shutdown waits for the server to exit after SIGTERM
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Produces the current snapshot of the web root and persists it on restart
pub trait SnapshotSource: Send + Sync {
    /// Scan and render, without writing anything
    fn current(&self) -> Result<ConfigSnapshot, LightspawnError>;

    /// Scan, render and write the rules the server will load on its next start
    fn regenerate(&self) -> Result<(), LightspawnError>;
}

impl SnapshotSource for ConfigGenerator {
    fn current(&self) -> Result<ConfigSnapshot, LightspawnError> {
        self.generate().map(|(_, snapshot)| snapshot)
    }

    fn regenerate(&self) -> Result<(), LightspawnError> {
        let (_, snapshot) = self.generate()?;
        self.write_rules(&snapshot, false)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SupervisorState {
    #[default]
    Idle,
    Running,
    RestartPending,
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// The worker started the server
    Started,
    /// The watcher saw a different snapshot
    SnapshotChanged,
    /// Marker created; `signaled` tells whether a server process received SIGTERM
    RestartTriggered { signaled: bool },
    /// The server exited with the marker present and is about to start again
    Restarting,
    /// The server exited without a pending restart
    Terminated { code: Option<i32> },
    RegenerationFailed(String),
    StartFailed(String),
}

impl SupervisorEvent {
    /// State the supervisor is in once this event has been emitted
    pub fn state(&self) -> SupervisorState {
        match self {
            SupervisorEvent::Started | SupervisorEvent::SnapshotChanged => SupervisorState::Running,
            SupervisorEvent::RestartTriggered { .. } | SupervisorEvent::Restarting => {
                SupervisorState::RestartPending
            }
            SupervisorEvent::Terminated { .. }
            | SupervisorEvent::RegenerationFailed(_)
            | SupervisorEvent::StartFailed(_) => SupervisorState::Terminated,
        }
    }
}

/// Optional event channel; a closed or missing receiver is ignored
#[derive(Debug, Clone, Default)]
pub(crate) struct EventSink(Option<UnboundedSender<SupervisorEvent>>);

impl EventSink {
    pub(crate) fn new(sender: Option<UnboundedSender<SupervisorEvent>>) -> Self {
        Self(sender)
    }

    pub(crate) fn emit(&self, event: SupervisorEvent) {
        if let Some(ref sender) = self.0 {
            let _ = sender.send(event);
        }
    }
}

/// Owns one supervised server for the lifetime of the invocation
pub struct RestartSupervisor {
    server: Arc<dyn Server>,
    source: Arc<dyn SnapshotSource>,
    handle: ServerHandle,
    marker: RestartMarker,
    interval: Duration,
    logger: SupervisorLogger,
    tail: Option<MultiTail>,
    events: EventSink,
}

impl RestartSupervisor {
    pub fn new(
        server: Arc<dyn Server>,
        source: Arc<dyn SnapshotSource>,
        handle: ServerHandle,
        marker: RestartMarker,
        interval: Duration,
        logger: SupervisorLogger,
    ) -> Self {
        Self {
            server,
            source,
            handle,
            marker,
            interval,
            logger,
            tail: None,
            events: EventSink::default(),
        }
    }

    /// Print new server log lines on every watcher iteration
    pub fn with_tail(mut self, tail: MultiTail) -> Self {
        self.tail = Some(tail);
        self
    }

    pub fn with_events(mut self, sender: UnboundedSender<SupervisorEvent>) -> Self {
        self.events = EventSink::new(Some(sender));
        self
    }

    /// Run until the server terminates or the process receives Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<WorkerExit> {
        self.run_until(shutdown_signal()).await
    }

    /// Run until the server terminates or `shutdown` resolves
    pub async fn run_until<F>(self, shutdown: F) -> Result<WorkerExit>
    where
        F: Future<Output = ()>,
    {
        self.logger
            .log_startup(&self.handle.command.to_string(), self.interval.as_secs_f64());

        let worker = Worker::new(
            self.server.clone(),
            self.source.clone(),
            self.handle.clone(),
            self.marker.clone(),
            self.logger.clone(),
            self.events.clone(),
        );
        let mut worker_task = tokio::task::spawn_blocking(move || worker.run());

        let mut watcher = Watcher::new(
            self.server.clone(),
            self.source.clone(),
            self.marker.clone(),
            self.handle.pid_file.clone(),
            self.interval,
            self.logger.clone(),
            self.events.clone(),
        );
        if let Some(tail) = self.tail {
            watcher = watcher.with_tail(tail);
        }
        let watcher_task = tokio::spawn(watcher.run());

        tokio::select! {
            exit = &mut worker_task => {
                watcher_task.abort();
                return exit.context("Server worker failed");
            }
            _ = shutdown => {
                debug!("Shutdown requested");
            }
        }

        // No restart may follow this kill
        watcher_task.abort();
        if let Err(e) = self.marker.consume() {
            warn!("Failed to remove {}: {}", self.marker.path().display(), e);
        }
        self.server.kill_by_pid_file(&self.handle.pid_file);

        match tokio::time::timeout(SHUTDOWN_GRACE, worker_task).await {
            Ok(exit) => exit.context("Server worker failed"),
            Err(_) => {
                warn!("{} did not exit after SIGTERM", self.server.name());
                Ok(WorkerExit::Interrupted)
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

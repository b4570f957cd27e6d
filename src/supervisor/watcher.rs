//! Web root watcher
//!
//! Polls the snapshot source once per interval and compares each snapshot
//! with the previous one. On a change it waits one more interval so a burst
//! of edits settles, then requests a restart and stops the running server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error};

use super::{EventSink, RestartMarker, SnapshotSource, SupervisorEvent};
use crate::logging::SupervisorLogger;
use crate::models::ConfigSnapshot;
use crate::server::Server;
use crate::tail::MultiTail;

/// Manages snapshot state between polling cycles
#[derive(Debug, Default)]
pub struct SnapshotTracker {
    previous: Option<ConfigSnapshot>,
}

impl SnapshotTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `snapshot` and tell whether it differs from the previous one.
    ///
    /// The first snapshot only establishes the baseline.
    pub fn observe(&mut self, snapshot: ConfigSnapshot) -> bool {
        let changed = match self.previous {
            None => false,
            Some(ref previous) => *previous != snapshot,
        };

        self.previous = Some(snapshot);
        changed
    }
}

pub struct Watcher {
    server: Arc<dyn Server>,
    source: Arc<dyn SnapshotSource>,
    marker: RestartMarker,
    pid_file: PathBuf,
    interval: Duration,
    tracker: SnapshotTracker,
    tail: Option<MultiTail>,
    logger: SupervisorLogger,
    events: EventSink,
}

impl Watcher {
    pub(crate) fn new(
        server: Arc<dyn Server>,
        source: Arc<dyn SnapshotSource>,
        marker: RestartMarker,
        pid_file: PathBuf,
        interval: Duration,
        logger: SupervisorLogger,
        events: EventSink,
    ) -> Self {
        Self {
            server,
            source,
            marker,
            pid_file,
            interval,
            tracker: SnapshotTracker::new(),
            tail: None,
            logger,
            events,
        }
    }

    pub fn with_tail(mut self, tail: MultiTail) -> Self {
        self.tail = Some(tail);
        self
    }

    /// One watcher iteration. Returns whether a restart was triggered.
    pub async fn poll_once(&mut self) -> bool {
        let triggered = match self.source.current() {
            Ok(snapshot) => self.tracker.observe(snapshot) && self.trigger_restart().await,
            Err(e) => {
                // Keep the previous baseline
                self.logger.log_error(&format!("Failed to compute snapshot: {}", e), Some("watcher"));
                false
            }
        };

        if let Some(ref mut tail) = self.tail {
            tail.print_new();
        }

        triggered
    }

    async fn trigger_restart(&mut self) -> bool {
        self.events.emit(SupervisorEvent::SnapshotChanged);
        self.logger.log_snapshot_change();

        // Debounce
        tokio::time::sleep(self.interval).await;

        // The marker must exist before the server exits
        if let Err(e) = self.marker.request() {
            error!("Failed to create {}: {}", self.marker.path().display(), e);
            return false;
        }

        let signaled = self.server.kill_by_pid_file(&self.pid_file);
        if !signaled {
            debug!("No running {} to stop", self.server.name());
        }

        self.logger.log_restart(signaled);
        self.events.emit(SupervisorEvent::RestartTriggered { signaled });
        true
    }

    /// Poll forever; the task is aborted by the supervisor
    pub async fn run(mut self) {
        loop {
            tokio::time::sleep(self.interval).await;
            self.poll_once().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{self, FakeServer, FakeSource};
    use super::*;
    use std::path::Path;
    use std::time::Instant;

    const INTERVAL: Duration = Duration::from_millis(50);

    fn snapshot(rules: &str) -> ConfigSnapshot {
        ConfigSnapshot::new("conf".to_string(), rules.to_string())
    }

    fn watcher(dir: &Path, server: Arc<FakeServer>, source: Arc<FakeSource>) -> Watcher {
        Watcher::new(
            server,
            source,
            RestartMarker::new(dir.join(".lightspawn_restart")),
            testing::handle(dir).pid_file,
            INTERVAL,
            SupervisorLogger::new(dir),
            EventSink::default(),
        )
    }

    // ==================== SnapshotTracker tests ====================

    #[test]
    fn test_first_snapshot_is_baseline() {
        let mut tracker = SnapshotTracker::new();
        assert!(!tracker.observe(snapshot("a")));
    }

    #[test]
    fn test_tracker_detects_changes_only() {
        let mut tracker = SnapshotTracker::new();
        tracker.observe(snapshot("a"));

        assert!(!tracker.observe(snapshot("a")));
        assert!(tracker.observe(snapshot("b")));
        assert!(!tracker.observe(snapshot("b")));
    }

    // ==================== poll_once() tests ====================

    #[tokio::test]
    async fn test_unchanged_cycles_never_request_restart() {
        let dir = tempfile::tempdir().unwrap();
        let server = Arc::new(FakeServer::new(dir.path()));
        let source = Arc::new(FakeSource::new("index.php"));
        let mut watcher = watcher(dir.path(), server.clone(), source);

        assert!(!watcher.poll_once().await);
        assert!(!watcher.poll_once().await);
        assert!(!watcher.poll_once().await);

        assert!(!dir.path().join(".lightspawn_restart").exists());
        assert!(server.kills().is_empty());
    }

    #[tokio::test]
    async fn test_change_debounces_then_marks_before_kill() {
        let dir = tempfile::tempdir().unwrap();
        let server = Arc::new(FakeServer::new(dir.path()));
        let source = Arc::new(FakeSource::new("index.php"));
        let mut watcher = watcher(dir.path(), server.clone(), source.clone());
        watcher.poll_once().await;

        source.set_rules("index.php robots.txt");
        let started = Instant::now();
        assert!(watcher.poll_once().await);

        assert!(started.elapsed() >= INTERVAL);
        assert!(dir.path().join(".lightspawn_restart").exists());
        // Marker present when the kill happened
        assert_eq!(server.kills(), vec![true]);
    }

    #[tokio::test]
    async fn test_change_is_reported_once() {
        let dir = tempfile::tempdir().unwrap();
        let server = Arc::new(FakeServer::new(dir.path()));
        let source = Arc::new(FakeSource::new("index.php"));
        let mut watcher = watcher(dir.path(), server.clone(), source.clone());
        watcher.poll_once().await;

        source.set_rules("index.php robots.txt");
        assert!(watcher.poll_once().await);
        assert!(!watcher.poll_once().await);
        assert_eq!(server.kills().len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_failure_keeps_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let server = Arc::new(FakeServer::new(dir.path()));
        let source = Arc::new(FakeSource::new("index.php"));
        let mut watcher = watcher(dir.path(), server.clone(), source.clone());
        watcher.poll_once().await;

        source.fail_current(true);
        assert!(!watcher.poll_once().await);

        source.fail_current(false);
        assert!(!watcher.poll_once().await);
        assert!(server.kills().is_empty());
    }

    #[tokio::test]
    async fn test_marker_failure_does_not_kill() {
        let dir = tempfile::tempdir().unwrap();
        let server = Arc::new(FakeServer::new(dir.path()));
        let source = Arc::new(FakeSource::new("index.php"));
        let mut watcher = Watcher::new(
            server.clone(),
            source.clone(),
            RestartMarker::new(dir.path().join("gone/.lightspawn_restart")),
            dir.path().join(".lightspawn.pid"),
            INTERVAL,
            SupervisorLogger::new(dir.path()),
            EventSink::default(),
        );
        watcher.poll_once().await;

        source.set_rules("index.php robots.txt");
        assert!(!watcher.poll_once().await);
        assert!(server.kills().is_empty());
    }
}

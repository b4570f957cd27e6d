//! Test doubles for the supervisor: an in-process server and a scripted snapshot source

use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

use crate::models::{ConfigSnapshot, Invocation, LightspawnError, ServerHandle};
use crate::server::Server;

use super::SnapshotSource;

type StartHook = Box<dyn Fn(usize) -> bool + Send + Sync>;

#[derive(Default)]
struct FakeState {
    running: bool,
    stop: bool,
    starts: usize,
    kills: Vec<bool>,
}

/// Server whose `start` blocks until `kill_by_pid_file` is called.
///
/// Each kill records whether the restart marker existed at that moment.
pub(crate) struct FakeServer {
    marker: PathBuf,
    state: Mutex<FakeState>,
    changed: Condvar,
    on_start: Option<StartHook>,
}

impl FakeServer {
    pub(crate) fn new(dir: &Path) -> Self {
        Self {
            marker: dir.join(".lightspawn_restart"),
            state: Mutex::new(FakeState::default()),
            changed: Condvar::new(),
            on_start: None,
        }
    }

    /// Hook called with the 1-based start count; returning `true` exits immediately
    pub(crate) fn with_on_start(mut self, hook: impl Fn(usize) -> bool + Send + Sync + 'static) -> Self {
        self.on_start = Some(Box::new(hook));
        self
    }

    pub(crate) fn starts(&self) -> usize {
        self.state.lock().unwrap().starts
    }

    pub(crate) fn kills(&self) -> Vec<bool> {
        self.state.lock().unwrap().kills.clone()
    }
}

impl Server for FakeServer {
    fn name(&self) -> &str {
        "fake"
    }

    fn resolve_executable(&self) -> Result<PathBuf, LightspawnError> {
        Ok(PathBuf::from("fake"))
    }

    fn build_command(&self, executable: &Path, config_file: &Path) -> Invocation {
        Invocation {
            program: executable.to_path_buf(),
            args: vec![config_file.as_os_str().to_os_string()],
        }
    }

    fn start(&self, _invocation: &Invocation, _working_dir: &Path) -> Result<ExitStatus, LightspawnError> {
        let starts = {
            let mut state = self.state.lock().unwrap();
            state.starts += 1;
            state.running = true;
            state.starts
        };

        let exit_now = self.on_start.as_ref().is_some_and(|hook| hook(starts));

        let mut state = self.state.lock().unwrap();
        while !exit_now && !state.stop {
            state = self.changed.wait(state).unwrap();
        }
        state.stop = false;
        state.running = false;
        Ok(ExitStatus::from_raw(0))
    }

    fn kill_by_pid_file(&self, _pid_file: &Path) -> bool {
        let mut state = self.state.lock().unwrap();
        state.kills.push(self.marker.exists());
        if !state.running {
            return false;
        }
        state.stop = true;
        self.changed.notify_all();
        true
    }

    fn is_running(&self, _pid_file: &Path) -> bool {
        self.state.lock().unwrap().running
    }
}

/// Snapshot source returning whatever rules text the test sets
pub(crate) struct FakeSource {
    rules: Mutex<String>,
    fail_current: AtomicBool,
    fail_regenerate: AtomicBool,
    regenerations: AtomicUsize,
}

impl FakeSource {
    pub(crate) fn new(rules: &str) -> Self {
        Self {
            rules: Mutex::new(rules.to_string()),
            fail_current: AtomicBool::new(false),
            fail_regenerate: AtomicBool::new(false),
            regenerations: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_rules(&self, rules: &str) {
        *self.rules.lock().unwrap() = rules.to_string();
    }

    pub(crate) fn fail_current(&self, fail: bool) {
        self.fail_current.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_regenerate(&self, fail: bool) {
        self.fail_regenerate.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn regenerations(&self) -> usize {
        self.regenerations.load(Ordering::SeqCst)
    }

    fn render_error() -> LightspawnError {
        LightspawnError::Render {
            template: "rules.conf".to_string(),
            source: "scripted failure".into(),
        }
    }
}

impl SnapshotSource for FakeSource {
    fn current(&self) -> Result<ConfigSnapshot, LightspawnError> {
        if self.fail_current.load(Ordering::SeqCst) {
            return Err(Self::render_error());
        }
        Ok(ConfigSnapshot::new("server.port = 4042".to_string(), self.rules.lock().unwrap().clone()))
    }

    fn regenerate(&self) -> Result<(), LightspawnError> {
        if self.fail_regenerate.load(Ordering::SeqCst) {
            return Err(Self::render_error());
        }
        self.regenerations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Handle with every path inside `dir`
pub(crate) fn handle(dir: &Path) -> ServerHandle {
    ServerHandle {
        pid_file: dir.join(".lightspawn.pid"),
        config_file: dir.join("lighttpd.conf"),
        rules_file: dir.join("rules.conf"),
        command: Invocation {
            program: PathBuf::from("fake"),
            args: vec![],
        },
        working_dir: dir.to_path_buf(),
    }
}

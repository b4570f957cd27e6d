#![allow(dead_code)]

use std::fs;
use std::io::Read;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use tempfile::TempDir;

/// Temporary PHP project: web/{index.php, frontend_dev.php, robots.txt, css/}
pub struct TestProject {
    pub temp_dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let web = temp_dir.path().join("web");
        fs::create_dir_all(web.join("css")).unwrap();
        fs::write(web.join("index.php"), "<?php echo 'index';").unwrap();
        fs::write(web.join("frontend_dev.php"), "<?php echo 'dev';").unwrap();
        fs::write(web.join("robots.txt"), "User-agent: *\n").unwrap();
        Self { temp_dir }
    }

    /// Project directory without a web root
    pub fn empty() -> Self {
        Self {
            temp_dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn cache(&self, name: &str) -> PathBuf {
        self.path().join("cache").join(name)
    }

    pub fn write_config(&self, content: &str) {
        fs::write(self.path().join("lightspawn.toml"), content).unwrap();
    }

    /// Shell script standing in for lighttpd: records its arguments and exits with `code`
    pub fn fake_lighttpd(&self, code: i32) -> PathBuf {
        let script = self.path().join("fake-lighttpd");
        fs::write(
            &script,
            format!("#!/bin/sh\necho \"$@\" > \"$PWD/lighttpd-args.txt\"\nexit {}\n", code),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    /// Shell script standing in for a foreground lighttpd: writes its PID file,
    /// records each start and runs until signaled
    pub fn long_running_lighttpd(&self) -> PathBuf {
        let script = self.path().join("fake-lighttpd");
        fs::write(
            &script,
            "#!/bin/sh\necho start >> \"$PWD/starts.txt\"\necho $$ > \"$PWD/cache/.lightspawn.pid.tmp\"\nmv \"$PWD/cache/.lightspawn.pid.tmp\" \"$PWD/cache/.lightspawn.pid\"\nexec sleep 30\n",
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    pub fn starts(&self) -> usize {
        fs::read_to_string(self.path().join("starts.txt"))
            .map(|content| content.lines().count())
            .unwrap_or(0)
    }

    pub fn recorded_args(&self) -> String {
        fs::read_to_string(self.path().join("lighttpd-args.txt")).unwrap_or_default()
    }

    /// `lightspawn` run from the project directory
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo_bin_cmd!("lightspawn");
        cmd.current_dir(self.path()).env_remove("RUST_LOG");
        cmd
    }

    /// `lightspawn` started in the background, for runs that end on a signal
    pub fn spawn(&self, args: &[&str]) -> Child {
        Command::new(env!("CARGO_BIN_EXE_lightspawn"))
            .args(args)
            .current_dir(self.path())
            .env_remove("RUST_LOG")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("failed to start lightspawn")
    }
}

/// Poll `condition` until it holds or `timeout` elapses
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(50));
    }
    condition()
}

pub fn terminate(child: &Child) {
    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).unwrap();
}

/// Wait for `child` to exit and collect its stdout; `None` on timeout, after killing it
pub fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Option<(ExitStatus, String)> {
    let mut status = None;
    wait_until(timeout, || {
        status = child.try_wait().unwrap();
        status.is_some()
    });

    let Some(status) = status else {
        let _ = child.kill();
        let _ = child.wait();
        return None;
    };

    let mut stdout = String::new();
    if let Some(mut pipe) = child.stdout.take() {
        pipe.read_to_string(&mut stdout).unwrap();
    }
    Some((status, stdout))
}

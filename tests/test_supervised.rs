use predicates::prelude::*;
use std::fs;
use std::time::Duration;

mod helpers;
use helpers::{terminate, wait_until, wait_with_timeout, TestProject};

#[test]
fn test_server_exit_without_restart_terminates() {
    let project = TestProject::new();
    let lighttpd = project.fake_lighttpd(0);

    project
        .command()
        .args(["--php-cgi-cmd", "php-cgi"])
        .arg("--lighttpd-cmd")
        .arg(&lighttpd)
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("Press Ctrl+C to stop serving."))
        .stdout(predicate::str::contains("Terminated."));

    assert!(project.recorded_args().starts_with("-D -f "));
    assert!(!project.cache(".lightspawn_restart").exists());
}

#[test]
fn test_stale_restart_marker_is_ignored() {
    let project = TestProject::new();
    std::fs::create_dir_all(project.path().join("cache")).unwrap();
    std::fs::write(project.cache(".lightspawn_restart"), "").unwrap();
    let lighttpd = project.fake_lighttpd(0);

    project
        .command()
        .args(["--php-cgi-cmd", "php-cgi"])
        .arg("--lighttpd-cmd")
        .arg(&lighttpd)
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("Terminated."))
        .stdout(predicate::str::contains("Restarting").not());
}

#[test]
fn test_new_file_restarts_server_with_new_rules() {
    let project = TestProject::new();
    project.write_config("[supervisor]\npolling_interval = 0.2\n");
    let lighttpd = project.long_running_lighttpd();
    let mut child = project.spawn(&["--php-cgi-cmd", "php-cgi", "--lighttpd-cmd", lighttpd.to_str().unwrap()]);

    assert!(
        wait_until(Duration::from_secs(10), || project.cache(".lightspawn.pid").exists()),
        "server never started"
    );
    // Let the watcher take its baseline
    std::thread::sleep(Duration::from_secs(1));
    fs::write(project.path().join("web/favicon.ico"), "").unwrap();

    let restarted = wait_until(Duration::from_secs(10), || project.starts() == 2);
    let rules = fs::read_to_string(project.cache("lighttpd/rules.conf")).unwrap();
    terminate(&child);
    let (status, stdout) =
        wait_with_timeout(&mut child, Duration::from_secs(10)).expect("lightspawn kept running after SIGTERM");

    assert!(restarted, "server was not restarted, stdout: {}", stdout);
    assert!(rules.contains(r#""^/favicon\.ico$" => "$0","#));
    assert!(!project.cache(".lightspawn_restart").exists());
    assert!(status.success());
    assert!(stdout.contains("Restarting lighttpd."));
    assert!(stdout.contains("Terminated."));
    assert_eq!(project.starts(), 2);
}

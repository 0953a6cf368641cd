use crate::prelude::{brummer_binary, Daemon};

#[test]
fn ping_reaches_a_running_daemon() {
    let daemon = Daemon::spawn();
    daemon.cli().args(&["ping"]).passes().stdout_has("pong");
}

#[test]
fn commands_against_a_missing_socket_report_not_running() {
    let daemon = Daemon::spawn();
    // Point at a socket nothing is listening on.
    let missing = daemon.state_path().join("no-such.sock");
    let output = std::process::Command::new(brummer_binary())
        .arg("--socket")
        .arg(&missing)
        .arg("ping")
        .output()
        .expect("brummer should run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not running"), "stderr: {stderr}");
}

//! End-to-end coder lifecycle (spec §8, scenario 1: "Create and start a
//! coder with the mock provider") plus the concurrency-limit boundary.

use crate::prelude::{wait_for, Daemon};

fn first_column(stdout: &str) -> String {
    stdout
        .split_whitespace()
        .next()
        .expect("coder output should start with an id")
        .to_string()
}

#[test]
fn create_start_and_delete_a_mock_coder() {
    let daemon = Daemon::spawn();

    let created = daemon
        .cli()
        .args(&["coder", "create", "demo", "--task", "hello", "--provider", "mock"])
        .passes();
    let stdout = created.stdout();
    assert!(stdout.contains("creating"), "stdout: {stdout}");
    let id = first_column(&stdout);

    daemon.cli().args(&["coder", "start", &id]).passes().stdout_has("ok");

    // The mock provider completes near-instantly once the ~50ms settle
    // window elapses; poll rather than assert a fixed sleep.
    let reached_terminal = wait_for(2_000, || {
        let out = daemon.cli().args(&["coder", "get", &id]).run();
        let text = out.stdout();
        text.contains("running") || text.contains("completed")
    });
    assert!(reached_terminal, "coder never reached running/completed");

    // Stop is legal from any non-terminal state and is required before delete.
    let stop = daemon.cli().args(&["coder", "stop", &id]).run();
    // If the mock provider already completed, Stop is illegal from a
    // terminal state; either outcome is fine as long as delete below works.
    let _ = stop;

    daemon.cli().args(&["coder", "delete", &id]).passes().stdout_has("ok");
    daemon.cli().args(&["coder", "get", &id]).fails().stderr_has("not found");
}

#[test]
fn create_fails_for_an_unknown_provider() {
    let daemon = Daemon::spawn();
    daemon
        .cli()
        .args(&["coder", "create", "demo", "--task", "hello", "--provider", "nonexistent"])
        .fails()
        .stderr_has("unknown provider");
}

#[test]
fn create_rejects_the_sixth_concurrent_coder() {
    let daemon = Daemon::spawn();
    for n in 0..5 {
        daemon
            .cli()
            .args(&["coder", "create", &format!("demo-{n}"), "--task", "hello", "--provider", "mock"])
            .passes();
    }
    daemon
        .cli()
        .args(&["coder", "create", "demo-6", "--task", "hello", "--provider", "mock"])
        .fails()
        .stderr_has("concurrency limit");
}

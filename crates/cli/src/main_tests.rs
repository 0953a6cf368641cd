// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use assert_cmd::Command;

/// The CLI has no running daemon in the test environment, so every
/// subcommand should fail with a clear "not running" message rather than
/// hang or panic.
#[test]
fn ping_without_a_daemon_reports_not_running() {
    let mut cmd = Command::cargo_bin("brummer").unwrap();
    cmd.args(["--socket", "/tmp/brummer-cli-tests-missing.sock", "ping"]);
    let output = cmd.output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not running"));
}

#[test]
fn coder_list_without_a_daemon_reports_not_running() {
    let mut cmd = Command::cargo_bin("brummer").unwrap();
    cmd.args(["--socket", "/tmp/brummer-cli-tests-missing.sock", "coder", "list"]);
    let output = cmd.output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not running"));
}

#[test]
fn help_lists_top_level_subcommands() {
    let mut cmd = Command::cargo_bin("brummer").unwrap();
    cmd.arg("--help");
    let output = cmd.output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("coder"));
    assert!(stdout.contains("pty"));
    assert!(stdout.contains("instances"));
}

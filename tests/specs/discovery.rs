//! Instance discovery, end to end through the daemon's self-registration
//! (spec §4.5, §8 scenario 4).

use crate::prelude::{wait_for, Daemon};

#[test]
fn a_running_daemon_registers_and_lists_itself() {
    let daemon = Daemon::spawn();

    let found = wait_for(2_000, || {
        let out = daemon.cli().args(&["instances"]).run();
        !out.stdout().contains("no instances discovered")
    });
    assert!(found, "daemon never registered itself with discovery");

    let listing = daemon.cli().args(&["instances"]).passes();
    let stdout = listing.stdout();
    assert_eq!(stdout.lines().count(), 1, "expected exactly one instance, got: {stdout}");

    let instance_file_count = std::fs::read_dir(daemon.state_path().join("instances"))
        .expect("instances dir should exist")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("json"))
        .count();
    assert_eq!(instance_file_count, 1);
}

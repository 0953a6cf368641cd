use super::*;

fn sample(id: &str) -> InstanceRecord {
    InstanceRecord {
        id: id.to_string(),
        name: "demo".into(),
        directory: "/home/demo/project".into(),
        port: 3000,
        started_at: Utc::now(),
        last_ping: Utc::now(),
        process_info: ProcessInfo {
            pid: 1234,
            executable: "brummerd".into(),
        },
    }
}

#[test]
fn valid_record_matches_its_filename_stem() {
    let record = sample("demo-1");
    assert!(validate_instance(&record, "demo-1").is_ok());
}

#[test]
fn rejects_id_filename_mismatch() {
    let record = sample("demo-1");
    let err = validate_instance(&record, "other-id").unwrap_err();
    assert!(matches!(err, CoreError::InstanceInvalid(_)));
}

#[test]
fn rejects_empty_id() {
    let mut record = sample("demo-1");
    record.id = String::new();
    assert!(validate_instance(&record, "").is_err());
}

#[test]
fn rejects_port_zero() {
    let mut record = sample("demo-1");
    record.port = 0;
    assert!(validate_instance(&record, "demo-1").is_err());
}

#[test]
fn rejects_timestamps_far_in_the_future() {
    let mut record = sample("demo-1");
    record.last_ping = Utc::now() + Duration::hours(1);
    assert!(validate_instance(&record, "demo-1").is_err());
}

#[test]
fn stale_when_last_ping_older_than_five_minutes() {
    let mut record = sample("demo-1");
    let now = Utc::now();
    record.last_ping = now - Duration::minutes(10);
    assert!(is_stale(&record, now, |_| true));
}

#[test]
fn stale_when_pid_not_running_even_if_ping_fresh() {
    let record = sample("demo-1");
    let now = Utc::now();
    assert!(is_stale(&record, now, |_| false));
}

#[test]
fn not_stale_when_ping_fresh_and_pid_running() {
    let record = sample("demo-1");
    let now = Utc::now();
    assert!(!is_stale(&record, now, |_| true));
}

#[test]
fn pid_zero_or_negative_is_always_dead() {
    let mut record = sample("demo-1");
    record.process_info.pid = 0;
    let now = Utc::now();
    assert!(is_stale(&record, now, |_| true));
}

use super::*;
use brummer_adapters::pty::PtySessionConfig;
use brummer_core::id::SequentialIdGen;
use std::time::Duration;

use crate::data_provider::{ErrorContext, InMemoryDataProvider};

fn test_manager() -> (Arc<PtyManager>, Arc<InMemoryDataProvider>) {
    let event_bus = EventBus::new(Some(2));
    let data_provider = Arc::new(InMemoryDataProvider::new());
    let manager = PtyManager::new(
        PtyManagerConfig::default(),
        event_bus,
        data_provider.clone(),
        Arc::new(SequentialIdGen::new("pty")),
    );
    (manager, data_provider)
}

async fn wait_until<F: Fn() -> bool>(predicate: F, timeout: Duration) {
    let start = tokio::time::Instant::now();
    while !predicate() {
        if start.elapsed() > timeout {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn create_session_becomes_current_when_none_exists() {
    let (manager, _) = test_manager();
    let config = PtySessionConfig::new("shell", "/bin/sh");
    let id = manager.create_session(config).unwrap();

    wait_until(|| manager.get_current_session().is_some(), Duration::from_secs(2)).await;
    assert_eq!(manager.get_current_session().unwrap().session_id, id);

    let _ = manager.close_all_sessions().await;
}

#[tokio::test]
async fn set_current_session_rejects_unknown_id_without_changing_pointer() {
    let (manager, _) = test_manager();
    let config = PtySessionConfig::new("shell", "/bin/sh");
    let id = manager.create_session(config).unwrap();
    wait_until(|| manager.get_current_session().is_some(), Duration::from_secs(2)).await;

    let err = manager
        .set_current_session(&brummer_core::PtySessionId::new("does-not-exist"))
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
    assert_eq!(manager.get_current_session().unwrap().session_id, id);

    let _ = manager.close_all_sessions().await;
}

#[tokio::test]
async fn next_and_previous_session_wrap_around() {
    let (manager, _) = test_manager();
    let first = manager.create_session(PtySessionConfig::new("a", "/bin/sh")).unwrap();
    let second = manager.create_session(PtySessionConfig::new("b", "/bin/sh")).unwrap();
    wait_until(|| manager.session_ids().len() == 2, Duration::from_secs(2)).await;

    manager.set_current_session(&first).unwrap();
    let next = manager.next_session().unwrap();
    assert_eq!(next, second);

    let wrapped = manager.next_session().unwrap();
    assert_eq!(wrapped, first);

    let back = manager.previous_session().unwrap();
    assert_eq!(back, second);

    let _ = manager.close_all_sessions().await;
}

#[tokio::test]
async fn close_session_removes_it_and_reassigns_current() {
    let (manager, _) = test_manager();
    let first = manager.create_session(PtySessionConfig::new("a", "/bin/sh")).unwrap();
    let second = manager.create_session(PtySessionConfig::new("b", "/bin/sh")).unwrap();
    wait_until(|| manager.session_ids().len() == 2, Duration::from_secs(2)).await;

    manager.set_current_session(&first).unwrap();
    manager.close_session(&first).await.unwrap();

    assert!(manager.get_session(&first).is_none());
    assert_eq!(manager.get_current_session().unwrap().session_id, second);
}

#[tokio::test]
async fn close_session_of_unknown_id_fails() {
    let (manager, _) = test_manager();
    let err = manager
        .close_session(&brummer_core::PtySessionId::new("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn inject_data_to_session_writes_formatted_error_as_input() {
    let (manager, data_provider) = test_manager();
    data_provider.push_error(ErrorContext {
        error_type: "RuntimeError".into(),
        severity: "error".into(),
        process: "web".into(),
        time: chrono::Utc::now(),
        message: "connection refused".into(),
        stack: vec![],
        context_lines: vec![],
    });

    let id = manager
        .create_session(PtySessionConfig::new("shell", "/bin/sh"))
        .unwrap();
    wait_until(|| manager.get_session(&id).is_some(), Duration::from_secs(2)).await;

    manager
        .inject_data_to_session(&id, InjectLabel::LastError)
        .unwrap();

    let _ = manager.close_all_sessions().await;
}

#[tokio::test]
async fn inject_data_to_session_is_a_no_op_when_nothing_to_report() {
    let (manager, _) = test_manager();
    let id = manager
        .create_session(PtySessionConfig::new("shell", "/bin/sh"))
        .unwrap();
    wait_until(|| manager.get_session(&id).is_some(), Duration::from_secs(2)).await;

    manager
        .inject_data_to_session(&id, InjectLabel::RecentLogs)
        .unwrap();

    let _ = manager.close_all_sessions().await;
}

#[test]
fn classify_output_matches_each_keyword_class() {
    assert_eq!(classify_output("Error: connection refused"), Some(AutoInjectTrigger::Error));
    assert_eq!(
        classify_output("test failed: expected true"),
        Some(AutoInjectTrigger::TestFailure)
    );
    assert_eq!(
        classify_output("compilation error in main.rs"),
        Some(AutoInjectTrigger::BuildFailure)
    );
    assert_eq!(classify_output("all good here"), None);
}

use super::*;
use std::time::Duration;
use tempfile::tempdir;
use tokio::time::timeout;

async fn next_matching(
    rx: &mut mpsc::UnboundedReceiver<WatchEvent>,
    matches: impl Fn(&WatchEvent) -> bool,
) -> WatchEvent {
    timeout(Duration::from_secs(10), async {
        loop {
            if let Some(event) = rx.recv().await {
                if matches(&event) {
                    return event;
                }
            }
        }
    })
    .await
    .expect("watch event should arrive within the test deadline")
}

#[tokio::test]
async fn detects_a_newly_created_file() {
    let dir = tempdir().expect("tempdir");
    let (_handle, mut rx) = watch(dir.path());

    let file_path = dir.path().join("instance-a.json");
    std::fs::write(&file_path, b"{}").expect("write instance file");

    let event = next_matching(&mut rx, |e| matches!(e, WatchEvent::Create(p) if p == &file_path)).await;
    assert_eq!(event, WatchEvent::Create(file_path));
}

#[tokio::test]
async fn detects_a_modified_file() {
    let dir = tempdir().expect("tempdir");
    let file_path = dir.path().join("instance-b.json");
    std::fs::write(&file_path, b"{\"ping\":1}").expect("write instance file");

    let (_handle, mut rx) = watch(dir.path());
    let _ = next_matching(&mut rx, |e| matches!(e, WatchEvent::Create(p) if p == &file_path)).await;

    std::fs::write(&file_path, b"{\"ping\":2}").expect("rewrite instance file");
    let event = next_matching(&mut rx, |e| matches!(e, WatchEvent::Write(p) if p == &file_path)).await;
    assert_eq!(event, WatchEvent::Write(file_path));
}

#[tokio::test]
async fn detects_a_removed_file() {
    let dir = tempdir().expect("tempdir");
    let file_path = dir.path().join("instance-c.json");
    std::fs::write(&file_path, b"{}").expect("write instance file");

    let (_handle, mut rx) = watch(dir.path());
    let _ = next_matching(&mut rx, |e| matches!(e, WatchEvent::Create(p) if p == &file_path)).await;

    std::fs::remove_file(&file_path).expect("remove instance file");
    let event = next_matching(&mut rx, |e| matches!(e, WatchEvent::Remove(p) if p == &file_path)).await;
    assert_eq!(event, WatchEvent::Remove(file_path));
}

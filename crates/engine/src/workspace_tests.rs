use super::*;
use brummer_core::CoderId;
use tempfile::tempdir;

fn manager() -> (WorkspaceManager, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    (WorkspaceManager::new(dir.path()), dir)
}

#[test]
fn init_workspace_creates_standard_layout_and_metadata() {
    let (mgr, _dir) = manager();
    let id = CoderId::new("c1");
    let root = mgr
        .init_workspace(&id, "2026-01-01T00:00:00Z", &["README.md".to_string()])
        .unwrap();

    assert!(root.join("src").is_dir());
    assert!(root.join("docs").is_dir());
    assert!(root.join("tests").is_dir());
    assert!(root.join(".aicoder").join("metadata.json").is_file());
    assert!(root.join("README.md").is_file());
}

#[test]
fn validate_path_rejects_parent_dir_traversal() {
    let (mgr, _dir) = manager();
    let id = CoderId::new("c1");
    let root = mgr.init_workspace(&id, "now", &[]).unwrap();

    let err = mgr.validate_path(&root, "../outside.txt").unwrap_err();
    assert!(matches!(err, brummer_core::CoreError::PathTraversal(_)));
}

#[test]
fn validate_path_rejects_absolute_path() {
    let (mgr, _dir) = manager();
    let id = CoderId::new("c1");
    let root = mgr.init_workspace(&id, "now", &[]).unwrap();

    let err = mgr.validate_path(&root, "/etc/passwd").unwrap_err();
    assert!(matches!(err, brummer_core::CoreError::PathTraversal(_)));
}

#[test]
fn write_then_read_file_round_trips() {
    let (mgr, _dir) = manager();
    let id = CoderId::new("c1");
    let root = mgr.init_workspace(&id, "now", &[]).unwrap();

    mgr.write_file(&root, "src/main.rs", b"fn main() {}").unwrap();
    let contents = mgr.read_file(&root, "src/main.rs").unwrap();
    assert_eq!(contents, b"fn main() {}");
}

#[test]
fn list_files_skips_directory_entries_and_leaf_dotfiles() {
    let (mgr, _dir) = manager();
    let id = CoderId::new("c1");
    let root = mgr.init_workspace(&id, "now", &["a.txt".to_string()]).unwrap();
    mgr.write_file(&root, "src/lib.rs", b"").unwrap();
    mgr.write_file(&root, ".gitignore", b"").unwrap();

    let files = mgr.list_files(&root).unwrap();
    assert!(files.contains(&PathBuf::from("a.txt")));
    assert!(files.contains(&PathBuf::from("src/lib.rs")));
    // `.aicoder` is a dot-*directory*; it is still walked into, so its
    // contained metadata file is a counted entry (spec scenario: 50 seed
    // files + `.aicoder/metadata.json` = 51 total).
    assert!(files.contains(&PathBuf::from(".aicoder/metadata.json")));
    // A leaf file whose own name starts with a dot is skipped.
    assert!(!files.iter().any(|p| p == &PathBuf::from(".gitignore")));
    // No directory itself is ever returned as an entry.
    assert!(!files.iter().any(|p| p == &PathBuf::from("src")));
}

#[test]
fn copy_file_creates_destination_parents() {
    let (mgr, _dir) = manager();
    let id = CoderId::new("c1");
    let root = mgr.init_workspace(&id, "now", &[]).unwrap();
    mgr.write_file(&root, "src/a.rs", b"content").unwrap();

    mgr.copy_file(&root, "src/a.rs", "docs/nested/a.rs").unwrap();
    assert_eq!(mgr.read_file(&root, "docs/nested/a.rs").unwrap(), b"content");
}

#[test]
fn cleanup_workspace_refuses_paths_outside_base() {
    let (mgr, dir) = manager();
    let outside = dir.path().parent().unwrap().join("not-a-workspace");
    std::fs::create_dir_all(&outside).unwrap();

    let err = mgr.cleanup_workspace(&outside).unwrap_err();
    assert!(matches!(err, brummer_core::CoreError::PathTraversal(_)));
    assert!(outside.exists());
}

#[test]
fn cleanup_workspace_removes_tree_under_base() {
    let (mgr, _dir) = manager();
    let id = CoderId::new("c1");
    let root = mgr.init_workspace(&id, "now", &[]).unwrap();
    assert!(root.exists());

    mgr.cleanup_workspace(&root).unwrap();
    assert!(!root.exists());
}

#[test]
fn concurrent_writes_of_distinct_files_all_round_trip() {
    let (mgr, _dir) = manager();
    let id = CoderId::new("c1");
    let root = mgr.init_workspace(&id, "now", &[]).unwrap();
    let mgr = std::sync::Arc::new(mgr);

    let handles: Vec<_> = (0..5)
        .map(|worker| {
            let mgr = std::sync::Arc::clone(&mgr);
            let root = root.clone();
            std::thread::spawn(move || {
                for i in 0..10 {
                    let name = format!("src/file-{worker}-{i}.txt");
                    let body = format!("worker {worker} file {i}");
                    mgr.write_file(&root, &name, body.as_bytes()).unwrap();
                    let read_back = mgr.read_file(&root, &name).unwrap();
                    assert_eq!(read_back, body.as_bytes());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let files = mgr.list_files(&root).unwrap();
    assert_eq!(files.len(), 51);
}

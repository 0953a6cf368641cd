use super::*;
use tempfile::tempdir;

#[test]
fn acquire_creates_lock_file_in_the_directory() {
    let dir = tempdir().unwrap();
    let lock = DirLock::acquire_default(dir.path()).unwrap();
    assert!(lock.path().exists());
    assert_eq!(lock.path().file_name().unwrap(), ".discovery.lock");
}

#[test]
fn second_acquire_times_out_while_first_is_held() {
    let dir = tempdir().unwrap();
    let _held = DirLock::acquire_default(dir.path()).unwrap();

    let result = DirLock::acquire(dir.path(), Duration::from_millis(20), Duration::from_millis(80));
    assert!(matches!(result, Err(LockError::Timeout(_))));
}

#[test]
fn lock_is_released_on_drop_allowing_reacquisition() {
    let dir = tempdir().unwrap();
    {
        let _held = DirLock::acquire_default(dir.path()).unwrap();
    }
    let reacquired = DirLock::acquire(dir.path(), Duration::from_millis(20), Duration::from_millis(200));
    assert!(reacquired.is_ok());
}

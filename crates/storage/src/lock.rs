// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-directory exclusive file lock, used by the Discovery Registry to
//! serialize every read/write sequence against `.discovery.lock` (spec
//! §3, §4.5).

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;
use thiserror::Error;

pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Filename of the per-directory lock file (spec §3, §4.5, §6). Exposed
/// so watchers over the same directory can recognize and ignore it.
pub const LOCK_FILE_NAME: &str = ".discovery.lock";

#[derive(Debug, Error)]
pub enum LockError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("lock acquisition timed out after {0:?}")]
    Timeout(Duration),
}

/// A held exclusive lock on a directory's `.discovery.lock` file. Released
/// automatically (via `fs2`'s OS-level unlock) when dropped, so every
/// error path — not just the success path — releases it.
pub struct DirLock {
    file: File,
    path: PathBuf,
}

impl DirLock {
    /// Opens (creating if needed) `{dir}/.discovery.lock` and blocks,
    /// retrying every `retry_interval`, until the exclusive lock is
    /// acquired or `timeout` elapses.
    pub fn acquire(dir: &Path, retry_interval: Duration, timeout: Duration) -> Result<Self, LockError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&path)?;

        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(Self { file, path }),
                Err(_) if Instant::now() < deadline => thread::sleep(retry_interval),
                Err(_) => return Err(LockError::Timeout(timeout)),
            }
        }
    }

    /// Convenience wrapper using the spec-default 100ms/30s policy.
    pub fn acquire_default(dir: &Path) -> Result<Self, LockError> {
        Self::acquire(dir, DEFAULT_RETRY_INTERVAL, DEFAULT_TIMEOUT)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;

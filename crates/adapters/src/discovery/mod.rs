// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory watcher mechanism behind the Instance Discovery Registry
//! (spec §4.5, C3): watches the instances directory for create/write/
//! remove events, preferring OS-native notifications and falling back
//! to polling with content hashing when a platform's fsnotify support is
//! unavailable or unreliable (e.g. certain container/network filesystem
//! setups).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Above this size, changed files are detected by length/mtime alone;
/// hashing the full contents of a large instance file on every poll
/// tick isn't worth the I/O (spec §4.5, §9).
const HASH_SIZE_LIMIT_BYTES: u64 = 1024 * 1024;
const POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Create(PathBuf),
    Write(PathBuf),
    Remove(PathBuf),
}

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to start filesystem watcher: {0}")]
    Notify(#[from] notify::Error),
}

/// Handle to a running watcher; dropping it (or calling [`stop`][Self::stop])
/// tears down the background task(s).
pub struct WatcherHandle {
    _native: Option<RecommendedWatcher>,
    stop_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl WatcherHandle {
    pub fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Watches `dir` (non-recursively) for instance-record file changes.
/// Starts a native `notify` watcher when the platform supports it; a
/// polling task always runs alongside as a safety net, since some
/// filesystems (network mounts, certain container overlay setups)
/// silently fail to deliver native events for a subset of writes.
pub fn watch(dir: impl Into<PathBuf>) -> (WatcherHandle, mpsc::UnboundedReceiver<WatchEvent>) {
    let dir = dir.into();
    let (tx, rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel();

    let native = start_native_watcher(&dir, tx.clone());
    spawn_poll_loop(dir, tx, stop_rx);

    (
        WatcherHandle {
            _native: native,
            stop_tx: Some(stop_tx),
        },
        rx,
    )
}

fn start_native_watcher(
    dir: &Path,
    tx: mpsc::UnboundedSender<WatchEvent>,
) -> Option<RecommendedWatcher> {
    let mut watcher = match notify::recommended_watcher(move |result: notify::Result<NotifyEvent>| {
        let Ok(event) = result else { return };
        for path in event.paths {
            let mapped = match event.kind {
                EventKind::Create(_) => Some(WatchEvent::Create(path)),
                EventKind::Modify(_) => Some(WatchEvent::Write(path)),
                EventKind::Remove(_) => Some(WatchEvent::Remove(path)),
                _ => None,
            };
            if let Some(mapped) = mapped {
                let _ = tx.send(mapped);
            }
        }
    }) {
        Ok(watcher) => watcher,
        Err(err) => {
            warn!(error = %err, "native filesystem watcher unavailable, relying on polling");
            return None;
        }
    };

    match watcher.watch(dir, RecursiveMode::NonRecursive) {
        Ok(()) => Some(watcher),
        Err(err) => {
            warn!(error = %err, directory = %dir.display(), "failed to watch instances directory natively");
            None
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
struct FileFingerprint {
    len: u64,
    modified: Option<std::time::SystemTime>,
    hash: Option<[u8; 32]>,
}

fn fingerprint(path: &Path) -> Option<FileFingerprint> {
    let metadata = std::fs::metadata(path).ok()?;
    let len = metadata.len();
    let modified = metadata.modified().ok();
    let hash = if len <= HASH_SIZE_LIMIT_BYTES {
        std::fs::read(path).ok().map(|bytes| {
            let mut hasher = Sha256::new();
            hasher.update(&bytes);
            hasher.finalize().into()
        })
    } else {
        None
    };
    Some(FileFingerprint { len, modified, hash })
}

fn spawn_poll_loop(
    dir: PathBuf,
    tx: mpsc::UnboundedSender<WatchEvent>,
    mut stop_rx: tokio::sync::oneshot::Receiver<()>,
) {
    tokio::spawn(async move {
        let mut known: HashMap<PathBuf, FileFingerprint> = HashMap::new();
        loop {
            tokio::select! {
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
                _ = &mut stop_rx => break,
            }

            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    debug!(error = %err, directory = %dir.display(), "poll loop could not list instances directory");
                    continue;
                }
            };

            let mut seen = std::collections::HashSet::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                seen.insert(path.clone());

                let Some(current) = fingerprint(&path) else { continue };
                match known.get(&path) {
                    None => {
                        known.insert(path.clone(), current);
                        let _ = tx.send(WatchEvent::Create(path));
                    }
                    Some(previous) if *previous != current => {
                        known.insert(path.clone(), current);
                        let _ = tx.send(WatchEvent::Write(path));
                    }
                    Some(_) => {}
                }
            }

            let removed: Vec<PathBuf> = known
                .keys()
                .filter(|path| !seen.contains(*path))
                .cloned()
                .collect();
            for path in removed {
                known.remove(&path);
                let _ = tx.send(WatchEvent::Remove(path));
            }
        }
    });
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

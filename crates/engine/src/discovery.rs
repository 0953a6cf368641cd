// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance Discovery Registry (spec §4.5, C3): an in-memory mirror of
//! the `{directory}/{id}.json` instance records on disk, kept current by
//! a background watcher task and guarded against concurrent writers by
//! [`brummer_storage::DirLock`]. `OnUpdate` callbacks receive a defensive
//! copy of the record set and run outside any internal lock, so a
//! callback that re-enters the registry can't deadlock it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use brummer_adapters::discovery::{watch, WatchEvent, WatcherHandle};
use brummer_core::instance::{is_stale, validate_instance};
use brummer_core::{CoreError, InstanceRecord};
use brummer_storage::lock::LockError;
use brummer_storage::{atomic_write_json, read_json, DirLock};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::config::DiscoveryConfig;

/// Instance record files are owner-only (spec §4.5, §6: "file mode 0600").
const RECORD_FILE_MODE: u32 = 0o600;

pub type UpdateCallback = Arc<dyn Fn(Vec<InstanceRecord>) + Send + Sync>;

struct WatcherState {
    handle: Option<WatcherHandle>,
}

/// Owns the in-memory mirror of every instance record under
/// [`DiscoveryConfig::directory`] (spec §4.5).
pub struct DiscoveryRegistry {
    config: DiscoveryConfig,
    records: RwLock<HashMap<String, InstanceRecord>>,
    callbacks: RwLock<Vec<UpdateCallback>>,
    watcher: Mutex<WatcherState>,
}

impl DiscoveryRegistry {
    pub fn new(config: DiscoveryConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            records: RwLock::new(HashMap::new()),
            callbacks: RwLock::new(Vec::new()),
            watcher: Mutex::new(WatcherState { handle: None }),
        })
    }

    /// Loads every existing record from disk, then starts the background
    /// watcher task that keeps the in-memory mirror current (spec §4.5).
    pub async fn start(self: &Arc<Self>) -> Result<(), CoreError> {
        let directory = self.config.directory.clone();
        let loaded = tokio::task::spawn_blocking(move || load_all_records(&directory))
            .await
            .map_err(|e| CoreError::WorkspaceIo(e.to_string()))??;

        *self.records.write() = loaded;

        let (handle, mut events) = watch(self.config.directory.clone());
        self.watcher.lock().handle = Some(handle);

        let registry = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                registry.on_watch_event(event).await;
            }
        });

        Ok(())
    }

    async fn on_watch_event(self: &Arc<Self>, event: WatchEvent) {
        if !is_instance_record_path(event_path(&event)) {
            return;
        }
        match event {
            WatchEvent::Create(path) | WatchEvent::Write(path) => {
                let Some(stem) = file_stem(&path) else { return };
                let record = tokio::task::spawn_blocking(move || read_json::<InstanceRecord>(&path))
                    .await;
                let record = match record {
                    Ok(Ok(Some(record))) => record,
                    Ok(Ok(None)) => return,
                    Ok(Err(err)) => {
                        warn!(error = %err, "failed to read changed instance record");
                        return;
                    }
                    Err(err) => {
                        warn!(error = %err, "instance record read task panicked");
                        return;
                    }
                };
                if let Err(err) = validate_instance(&record, &stem) {
                    warn!(error = %err, id = %stem, "ignoring invalid instance record");
                    return;
                }
                self.records.write().insert(record.id.clone(), record);
                self.notify();
            }
            WatchEvent::Remove(path) => {
                if let Some(stem) = file_stem(&path) {
                    self.records.write().remove(&stem);
                    self.notify();
                }
            }
        }
    }

    fn notify(&self) {
        let snapshot: Vec<InstanceRecord> = self.records.read().values().cloned().collect();
        for callback in self.callbacks.read().iter() {
            callback(snapshot.clone());
        }
    }

    /// Registers a callback invoked with a full snapshot after any change
    /// (spec §4.5: "`OnUpdate` delivers a defensive copy").
    pub fn on_update(&self, callback: UpdateCallback) {
        self.callbacks.write().push(callback);
    }

    /// Validates, writes atomically under the directory lock, and
    /// updates the in-memory mirror (spec §4.5).
    pub async fn register_instance(&self, record: InstanceRecord) -> Result<(), CoreError> {
        validate_instance(&record, &record.id)?;

        let directory = self.config.directory.clone();
        let lock_timeout = self.config.lock_timeout;
        let record_to_write = record.clone();
        tokio::task::spawn_blocking(move || write_record_locked(&directory, lock_timeout, &record_to_write))
            .await
            .map_err(|e| CoreError::WorkspaceIo(e.to_string()))??;

        self.records.write().insert(record.id.clone(), record);
        self.notify();
        Ok(())
    }

    pub async fn unregister_instance(&self, id: &str) -> Result<(), CoreError> {
        let directory = self.config.directory.clone();
        let lock_timeout = self.config.lock_timeout;
        let id_owned = id.to_string();
        tokio::task::spawn_blocking(move || remove_record_locked(&directory, lock_timeout, &id_owned))
            .await
            .map_err(|e| CoreError::WorkspaceIo(e.to_string()))??;

        self.records.write().remove(id);
        self.notify();
        Ok(())
    }

    /// Rewrites `last_ping`, failing `NotFound` if `id` isn't registered
    /// (spec §4.5).
    pub async fn update_instance_ping(&self, id: &str) -> Result<(), CoreError> {
        let mut record = self
            .records
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        record.last_ping = Utc::now();
        self.register_instance(record).await
    }

    pub fn get_instance(&self, id: &str) -> Option<InstanceRecord> {
        self.records.read().get(id).cloned()
    }

    pub fn list_instances(&self) -> Vec<InstanceRecord> {
        self.records.read().values().cloned().collect()
    }

    /// Removes every record whose ping has gone quiet or whose PID is no
    /// longer running (spec §4.5), returning the ids removed. Unlike
    /// [`Self::unregister_instance`], the whole sweep notifies callbacks
    /// at most once, after every removal has landed in memory and on
    /// disk (spec §4.5: "callbacks are notified once after the sweep if
    /// any removals occurred").
    pub async fn cleanup_stale_instances(&self, pid_is_running: impl Fn(i64) -> bool) -> Vec<String> {
        let now = Utc::now();
        let stale_ids: Vec<String> = self
            .records
            .read()
            .values()
            .filter(|record| is_stale(record, now, &pid_is_running))
            .map(|record| record.id.clone())
            .collect();

        let directory = self.config.directory.clone();
        let lock_timeout = self.config.lock_timeout;
        let mut removed_ids = Vec::with_capacity(stale_ids.len());
        for id in &stale_ids {
            let directory = directory.clone();
            let id_owned = id.clone();
            let result = tokio::task::spawn_blocking(move || remove_record_locked(&directory, lock_timeout, &id_owned))
                .await
                .map_err(|e| CoreError::WorkspaceIo(e.to_string()))
                .and_then(std::convert::identity);
            match result {
                Ok(()) => {
                    self.records.write().remove(id);
                    removed_ids.push(id.clone());
                }
                Err(err) => warn!(error = %err, id, "failed to remove stale instance record"),
            }
        }

        if !removed_ids.is_empty() {
            self.notify();
        }
        removed_ids
    }

    /// Stops the background watcher task. Further filesystem changes are
    /// no longer reflected in the in-memory mirror after this returns
    /// (spec §4.5).
    pub fn stop(&self) {
        if let Some(handle) = self.watcher.lock().handle.take() {
            handle.stop();
        }
    }
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()?.to_str().map(str::to_string)
}

fn event_path(event: &WatchEvent) -> &Path {
    match event {
        WatchEvent::Create(path) | WatchEvent::Write(path) | WatchEvent::Remove(path) => path,
    }
}

/// Spec §4.5: only react to events "whose basename has extension `.json`
/// (and is not the lock file)" — every `DirLock::acquire` touches
/// `.discovery.lock` on the very same directory the watcher covers, so
/// without this filter every register/unregister would also trigger a
/// spurious (and noisy) attempt to load the lock file as an instance
/// record.
fn is_instance_record_path(path: &Path) -> bool {
    if path.file_name().and_then(|n| n.to_str()) == Some(brummer_storage::lock::LOCK_FILE_NAME) {
        return false;
    }
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

/// The discovery directory itself is owner-only (spec §4.5, §6:
/// "Directory mode 0700").
#[cfg(unix)]
fn set_directory_mode(directory: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(directory, std::fs::Permissions::from_mode(0o700))
}

#[cfg(not(unix))]
fn set_directory_mode(_directory: &Path) -> std::io::Result<()> {
    Ok(())
}

fn load_all_records(directory: &Path) -> Result<HashMap<String, InstanceRecord>, CoreError> {
    std::fs::create_dir_all(directory).map_err(|e| CoreError::WorkspaceIo(e.to_string()))?;
    set_directory_mode(directory).map_err(|e| CoreError::WorkspaceIo(e.to_string()))?;
    let mut records = HashMap::new();
    let entries = std::fs::read_dir(directory).map_err(|e| CoreError::WorkspaceIo(e.to_string()))?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = file_stem(&path) else { continue };
        match read_json::<InstanceRecord>(&path) {
            Ok(Some(record)) => match validate_instance(&record, &stem) {
                Ok(()) => {
                    records.insert(record.id.clone(), record);
                }
                Err(err) => warn!(error = %err, id = %stem, "skipping invalid instance record on load"),
            },
            Ok(None) => {}
            Err(err) => warn!(error = %err, path = %path.display(), "failed to read instance record on load"),
        }
    }
    debug!(count = records.len(), "loaded instance records from disk");
    Ok(records)
}

fn lock_error_to_core(err: LockError) -> CoreError {
    match err {
        LockError::Io(io) => CoreError::WorkspaceIo(io.to_string()),
        LockError::Timeout(timeout) => CoreError::LockTimeout(timeout),
    }
}

fn record_path(directory: &Path, id: &str) -> PathBuf {
    directory.join(format!("{id}.json"))
}

fn write_record_locked(
    directory: &Path,
    lock_timeout: std::time::Duration,
    record: &InstanceRecord,
) -> Result<(), CoreError> {
    let _lock = DirLock::acquire(directory, brummer_storage::lock::DEFAULT_RETRY_INTERVAL, lock_timeout)
        .map_err(lock_error_to_core)?;
    let path = record_path(directory, &record.id);
    atomic_write_json(&path, record, Some(RECORD_FILE_MODE)).map_err(|e| CoreError::WorkspaceIo(e.to_string()))
}

fn remove_record_locked(directory: &Path, lock_timeout: std::time::Duration, id: &str) -> Result<(), CoreError> {
    let _lock = DirLock::acquire(directory, brummer_storage::lock::DEFAULT_RETRY_INTERVAL, lock_timeout)
        .map_err(lock_error_to_core)?;
    let path = record_path(directory, id);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(CoreError::WorkspaceIo(err.to_string())),
    }
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;

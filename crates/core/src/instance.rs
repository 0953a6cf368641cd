// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance Discovery Registry data model (spec §3, §4.5, §6).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Opaque process descriptor carried alongside an instance record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: i64,
    pub executable: String,
}

/// The JSON document written under the discovery directory as
/// `{id}.json` (spec §4.5, §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub id: String,
    pub name: String,
    pub directory: String,
    pub port: u16,
    pub started_at: DateTime<Utc>,
    pub last_ping: DateTime<Utc>,
    pub process_info: ProcessInfo,
}

/// Instances with no ping in this window are swept by
/// `cleanup_stale_instances` (spec §4.5).
pub const STALE_AFTER: Duration = Duration::minutes(5);

/// Validates the invariants spec §3 places on an instance record:
/// non-empty id, filename-stem match, a valid port, and timestamps not
/// more than a minute in the future (to tolerate clock skew between the
/// process that wrote the file and the one reading it).
pub fn validate_instance(record: &InstanceRecord, filename_stem: &str) -> Result<(), CoreError> {
    if record.id.is_empty() {
        return Err(CoreError::InstanceInvalid("id must not be empty".into()));
    }
    if record.id != filename_stem {
        return Err(CoreError::InstanceInvalid(format!(
            "id {} does not match filename stem {}",
            record.id, filename_stem
        )));
    }
    if record.port == 0 {
        return Err(CoreError::InstanceInvalid("port must be in 1..=65535".into()));
    }

    let skew_limit = Utc::now() + Duration::minutes(1);
    if record.started_at > skew_limit {
        return Err(CoreError::InstanceInvalid(
            "started_at is more than one minute in the future".into(),
        ));
    }
    if record.last_ping > skew_limit {
        return Err(CoreError::InstanceInvalid(
            "last_ping is more than one minute in the future".into(),
        ));
    }

    Ok(())
}

/// An instance is stale if it hasn't pinged recently, or if its PID is
/// not running. PID liveness is delegated to the caller (it requires an
/// OS check) via `pid_is_running`; `pid <= 0` is always dead per spec §4.5.
pub fn is_stale(record: &InstanceRecord, now: DateTime<Utc>, pid_is_running: impl Fn(i64) -> bool) -> bool {
    let ping_stale = now - record.last_ping > STALE_AFTER;
    let pid_dead = record.process_info.pid <= 0 || !pid_is_running(record.process_info.pid);
    ping_stale || pid_dead
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;

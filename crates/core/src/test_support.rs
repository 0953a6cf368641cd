// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test-only builders shared by every crate's test suite. Gated behind
//! `feature = "test-support"` so production builds never link it.

use chrono::Utc;

use crate::coder::{Coder, CoderId, CoderState};
use crate::instance::{InstanceRecord, ProcessInfo};

/// A minimal `Coder` in the `Creating` state, ready for a test to mutate.
pub fn sample_coder(id: &str) -> Coder {
    let now = Utc::now();
    Coder {
        id: CoderId::new(id),
        name: format!("coder-{id}"),
        provider: "mock".into(),
        workspace_root: std::path::PathBuf::from(format!("/tmp/brummer-test/{id}")),
        state: CoderState::Creating,
        created_at: now,
        updated_at: now,
        task: "test task".into(),
        progress: 0.0,
        status_message: None,
        session_tag: id.to_string(),
        attached_ui_count: 0,
    }
}

/// A fresh, valid `InstanceRecord` whose id matches its intended filename
/// stem, with the current process as a live PID.
pub fn sample_instance(id: &str, port: u16) -> InstanceRecord {
    let now = Utc::now();
    InstanceRecord {
        id: id.to_string(),
        name: format!("instance-{id}"),
        directory: "/home/demo/project".into(),
        port,
        started_at: now,
        last_ping: now,
        process_info: ProcessInfo {
            pid: std::process::id() as i64,
            executable: "brummerd".into(),
        },
    }
}

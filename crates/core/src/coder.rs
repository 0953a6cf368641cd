// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Coder data model and lifecycle state machine (spec §3, §4.1).

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::define_id;
use crate::error::CoreError;

define_id!(CoderId);

/// Lifecycle states of a managed coder. See spec §4.1's transition table;
/// [`CoderState::transition`] is the single authority for which moves are
/// legal, so the manager and its tests share one source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoderState {
    Creating,
    Running,
    Paused,
    Completed,
    Failed,
    Stopped,
}

/// The operation being requested of the state machine. Internal variants
/// (`Complete`, `Fail`) are raised by the manager itself rather than by a
/// caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoderOp {
    Start,
    Pause,
    Resume,
    Stop,
    Complete,
    Fail,
}

impl CoderOp {
    fn label(self) -> &'static str {
        match self {
            CoderOp::Start => "start",
            CoderOp::Pause => "pause",
            CoderOp::Resume => "resume",
            CoderOp::Stop => "stop",
            CoderOp::Complete => "complete",
            CoderOp::Fail => "fail",
        }
    }
}

impl CoderState {
    fn label(self) -> &'static str {
        match self {
            CoderState::Creating => "creating",
            CoderState::Running => "running",
            CoderState::Paused => "paused",
            CoderState::Completed => "completed",
            CoderState::Failed => "failed",
            CoderState::Stopped => "stopped",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CoderState::Completed | CoderState::Failed)
    }

    /// Applies `op` to `self`, returning the destination state or
    /// `IllegalTransition` if the table in spec §4.1 has no entry.
    pub fn transition(self, op: CoderOp) -> Result<CoderState, CoreError> {
        use CoderOp::*;
        use CoderState::*;

        let dest = match (self, op) {
            (Creating, Start) => Running,
            (Creating, Stop) => Stopped,
            (Creating, Complete) => Completed,
            (Creating, Fail) => Failed,

            (Running, Pause) => Paused,
            (Running, Stop) => Stopped,
            (Running, Complete) => Completed,
            (Running, Fail) => Failed,

            (Paused, Resume) => Running,
            (Paused, Stop) => Stopped,
            (Paused, Fail) => Failed,

            (Stopped, Start) => Running,

            _ => {
                return Err(CoreError::IllegalTransition {
                    from: self.label().to_string(),
                    attempted: op.label().to_string(),
                });
            }
        };
        Ok(dest)
    }
}

/// Parameters for `CoderManager::create`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoderRequest {
    pub provider: Option<String>,
    pub name: String,
    pub task: String,
    pub workspace_files: Vec<String>,
}

/// A managed assistant session with its own workspace, provider, and
/// lifecycle (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coder {
    pub id: CoderId,
    pub name: String,
    pub provider: String,
    pub workspace_root: PathBuf,
    pub state: CoderState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub task: String,
    pub progress: f32,
    pub status_message: Option<String>,
    pub session_tag: String,
    pub attached_ui_count: u32,
}

impl Coder {
    /// `progress` is always clamped into `[0, 1]`; spec §3 explicitly
    /// permits it to decrease across transitions but never leave the
    /// unit interval.
    pub fn set_progress(&mut self, progress: f32) {
        self.progress = progress.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
#[path = "coder_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The event taxonomy (spec §6). Every event carries a wire-level string
//! tag; coder events additionally carry `{coder_id, coder_name, status,
//! message, data}`, PTY events carry `{session_id, payload}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coder::{CoderId, CoderState};
use crate::session::PtySessionId;

/// Coder lifecycle payload shared by every `ai_coder_*` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoderEventPayload {
    pub coder_id: CoderId,
    pub coder_name: String,
    pub status: CoderState,
    pub message: Option<String>,
    pub time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// Payload carried by `output`/`input`/`resize`/`close`/`data_inject` and
/// the `pty_session_*` events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PtyEventPayload {
    pub session_id: PtySessionId,
    pub time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl PtyEventPayload {
    pub fn new(session_id: PtySessionId, time: DateTime<Utc>) -> Self {
        Self {
            session_id,
            time,
            bytes: None,
            error: None,
            label: None,
        }
    }
}

/// All wire event types, tagged by their spec §6 string name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "ai_coder_created")]
    CoderCreated(CoderEventPayload),
    #[serde(rename = "ai_coder_started")]
    CoderStarted(CoderEventPayload),
    #[serde(rename = "ai_coder_paused")]
    CoderPaused(CoderEventPayload),
    #[serde(rename = "ai_coder_resumed")]
    CoderResumed(CoderEventPayload),
    #[serde(rename = "ai_coder_completed")]
    CoderCompleted(CoderEventPayload),
    #[serde(rename = "ai_coder_failed")]
    CoderFailed(CoderEventPayload),
    #[serde(rename = "ai_coder_stopped")]
    CoderStopped(CoderEventPayload),
    #[serde(rename = "ai_coder_deleted")]
    CoderDeleted(CoderEventPayload),
    #[serde(rename = "ai_coder_progress")]
    CoderProgress(CoderEventPayload),

    #[serde(rename = "output")]
    Output(PtyEventPayload),
    #[serde(rename = "input")]
    Input(PtyEventPayload),
    #[serde(rename = "resize")]
    Resize(PtyEventPayload),
    #[serde(rename = "close")]
    Close(PtyEventPayload),
    #[serde(rename = "data_inject")]
    DataInject(PtyEventPayload),
    #[serde(rename = "pty_session_created")]
    PtySessionCreated(PtyEventPayload),
    #[serde(rename = "pty_session_focused")]
    PtySessionFocused(PtyEventPayload),
    #[serde(rename = "pty_session_switched")]
    PtySessionSwitched(PtyEventPayload),
    #[serde(rename = "pty_session_closed")]
    PtySessionClosed(PtyEventPayload),
}

impl Event {
    /// The wire-level string tag, used as the Event Bus's subscription
    /// key (spec §4.6: "subscribers register by event-type tag").
    pub fn tag(&self) -> &'static str {
        match self {
            Event::CoderCreated(_) => "ai_coder_created",
            Event::CoderStarted(_) => "ai_coder_started",
            Event::CoderPaused(_) => "ai_coder_paused",
            Event::CoderResumed(_) => "ai_coder_resumed",
            Event::CoderCompleted(_) => "ai_coder_completed",
            Event::CoderFailed(_) => "ai_coder_failed",
            Event::CoderStopped(_) => "ai_coder_stopped",
            Event::CoderDeleted(_) => "ai_coder_deleted",
            Event::CoderProgress(_) => "ai_coder_progress",
            Event::Output(_) => "output",
            Event::Input(_) => "input",
            Event::Resize(_) => "resize",
            Event::Close(_) => "close",
            Event::DataInject(_) => "data_inject",
            Event::PtySessionCreated(_) => "pty_session_created",
            Event::PtySessionFocused(_) => "pty_session_focused",
            Event::PtySessionSwitched(_) => "pty_session_switched",
            Event::PtySessionClosed(_) => "pty_session_closed",
        }
    }

    /// `Some(session_id)` for PTY events, `None` for coder events (which
    /// key on `coder_id` instead — see [`Event::coder_id`]).
    pub fn session_id(&self) -> Option<&PtySessionId> {
        match self {
            Event::Output(p)
            | Event::Input(p)
            | Event::Resize(p)
            | Event::Close(p)
            | Event::DataInject(p)
            | Event::PtySessionCreated(p)
            | Event::PtySessionFocused(p)
            | Event::PtySessionSwitched(p)
            | Event::PtySessionClosed(p) => Some(&p.session_id),
            _ => None,
        }
    }

    pub fn coder_id(&self) -> Option<&CoderId> {
        match self {
            Event::CoderCreated(p)
            | Event::CoderStarted(p)
            | Event::CoderPaused(p)
            | Event::CoderResumed(p)
            | Event::CoderCompleted(p)
            | Event::CoderFailed(p)
            | Event::CoderStopped(p)
            | Event::CoderDeleted(p)
            | Event::CoderProgress(p) => Some(&p.coder_id),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;

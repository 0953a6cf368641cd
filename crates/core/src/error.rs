// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds shared across the Coder Manager, PTY Manager, and Discovery
//! Registry. Downstream crates (`brummer-adapters`, `brummer-engine`) wrap
//! these in their own `thiserror` enums where a mechanism-specific cause
//! (an `io::Error`, a `serde_json::Error`, ...) needs to be attached.

use thiserror::Error;

/// Stable error kind plus a human message, per spec §7's "user-visible
/// surface" requirement. Every public operation in C1–C3 returns one of
/// these (or wraps one, carrying an underlying cause) rather than
/// crashing on a recoverable fault.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("provider already registered: {0}")]
    ProviderExists(String),

    #[error("invalid provider configuration: {0}")]
    ProviderConfigInvalid(String),

    #[error("concurrency limit reached ({max} max active coders)")]
    ConcurrencyLimit { max: usize },

    #[error("illegal transition: {from} -> {attempted}")]
    IllegalTransition { from: String, attempted: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("workspace I/O error: {0}")]
    WorkspaceIo(String),

    #[error("path traversal rejected: {0}")]
    PathTraversal(String),

    #[error("provider upstream error: {0}")]
    ProviderUpstream(String),

    #[error("buffer full")]
    BufferFull,

    #[error("session closed")]
    SessionClosed,

    #[error("lock acquisition timed out after {0:?}")]
    LockTimeout(std::time::Duration),

    #[error("invalid instance record: {0}")]
    InstanceInvalid(String),

    #[error("operation cancelled")]
    Cancelled,
}

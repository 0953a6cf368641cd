// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! brummer-storage: atomic JSON file persistence and directory locking
//! used by the Instance Discovery Registry (C3) and workspace metadata.

pub mod atomic;
pub mod lock;

pub use atomic::{atomic_write_json, read_json, AtomicWriteError};
pub use lock::{DirLock, LockError};

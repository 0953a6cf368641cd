// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-component configuration structs (spec §6, §9 DESIGN NOTES: "no
//! ambient global... configuration is passed via a `Config` handle").
//! `brummer-daemon` assembles these from its own on-disk config and
//! passes each by reference into the matching constructor; nothing here
//! reads the environment or a file itself.

use std::path::PathBuf;
use std::time::Duration;

/// `concurrency.coder.*` (spec §6).
#[derive(Debug, Clone)]
pub struct CoderManagerConfig {
    pub max_concurrent: usize,
    pub workspace_base_dir: PathBuf,
    pub default_provider: String,
}

impl Default for CoderManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            workspace_base_dir: std::env::temp_dir().join("brummer").join("workspaces"),
            default_provider: "claude".to_string(),
        }
    }
}

/// `discovery.*` (spec §6).
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub directory: PathBuf,
    pub lock_timeout: Duration,
    pub stale_timeout: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            directory: default_instances_dir(),
            lock_timeout: Duration::from_secs(30),
            stale_timeout: Duration::from_secs(300),
        }
    }
}

/// `$XDG_RUNTIME_DIR/brummer/instances`, falling back to
/// `$TMPDIR/brummer/instances` (spec §4.5).
pub fn default_instances_dir() -> PathBuf {
    let base = std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);
    base.join("brummer").join("instances")
}

/// `pty.*` (spec §6).
#[derive(Debug, Clone, Copy)]
pub struct PtyManagerConfig {
    pub history_bytes_max: usize,
    pub io_buffer_bytes: usize,
}

impl Default for PtyManagerConfig {
    fn default() -> Self {
        Self {
            history_bytes_max: 10 * 1024 * 1024,
            io_buffer_bytes: 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_schema() {
        let coder = CoderManagerConfig::default();
        assert_eq!(coder.max_concurrent, 5);
        assert_eq!(coder.default_provider, "claude");

        let discovery = DiscoveryConfig::default();
        assert_eq!(discovery.lock_timeout, Duration::from_secs(30));
        assert_eq!(discovery.stale_timeout, Duration::from_secs(300));

        let pty = PtyManagerConfig::default();
        assert_eq!(pty.history_bytes_max, 10 * 1024 * 1024);
        assert_eq!(pty.io_buffer_bytes, 4096);
    }
}

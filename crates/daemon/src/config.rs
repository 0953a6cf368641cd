// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration and state-directory resolution (spec §6, §9).
//! `BRUMMER_STATE_DIR`, then `$XDG_STATE_HOME/brummer`, then
//! `~/.local/state/brummer`.

use std::path::PathBuf;

use brummer_engine::{CoderManagerConfig, DiscoveryConfig, PtyManagerConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error preparing state directory: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub log_path: PathBuf,
    pub coder: CoderManagerConfig,
    pub discovery: DiscoveryConfig,
    pub pty: PtyManagerConfig,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let state_dir = state_dir();
        std::fs::create_dir_all(&state_dir)?;

        let coder = CoderManagerConfig {
            workspace_base_dir: state_dir.join("workspaces"),
            ..CoderManagerConfig::default()
        };
        let discovery = DiscoveryConfig {
            directory: state_dir.join("instances"),
            ..DiscoveryConfig::default()
        };

        Ok(Self {
            socket_path: state_dir.join("brummer.sock"),
            lock_path: state_dir.join("brummer.lock"),
            log_path: state_dir.join("brummer.log"),
            state_dir,
            coder,
            discovery,
            pty: PtyManagerConfig::default(),
        })
    }
}

fn state_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("BRUMMER_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(xdg) = std::env::var_os("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("brummer");
    }
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".local")
        .join("state")
        .join("brummer")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn state_dir_honors_brummer_state_dir_override() {
        let previous = std::env::var_os("BRUMMER_STATE_DIR");
        std::env::set_var("BRUMMER_STATE_DIR", "/tmp/brummer-test-override");
        assert_eq!(state_dir(), PathBuf::from("/tmp/brummer-test-override"));
        match previous {
            Some(value) => std::env::set_var("BRUMMER_STATE_DIR", value),
            None => std::env::remove_var("BRUMMER_STATE_DIR"),
        }
    }
}

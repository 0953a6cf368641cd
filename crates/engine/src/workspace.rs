// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace Manager (spec §4.2, C1 sub-component): allocates and
//! path-validates the per-coder directory tree.

use std::path::{Component, Path, PathBuf};

use brummer_core::{CoderId, CoreError};
use brummer_storage::atomic_write_json;
use serde::Serialize;
use tracing::warn;

/// `.aicoder/metadata.json`, written at workspace init (spec §3).
#[derive(Debug, Serialize)]
struct WorkspaceMetadata<'a> {
    coder_id: &'a str,
    created_at: String,
}

pub struct WorkspaceManager {
    base_dir: PathBuf,
}

impl WorkspaceManager {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn workspace_root(&self, coder_id: &CoderId) -> PathBuf {
        self.base_dir.join(coder_id.as_str())
    }

    /// Creates `{base}/{coderID}/{src,docs,tests}` and
    /// `.aicoder/metadata.json`, then seeds each requested file with an
    /// empty stub (spec §4.1's `Create`).
    pub fn init_workspace(
        &self,
        coder_id: &CoderId,
        created_at: &str,
        seed_files: &[String],
    ) -> Result<PathBuf, CoreError> {
        let root = self.workspace_root(coder_id);
        for dir in ["src", "docs", "tests"] {
            std::fs::create_dir_all(root.join(dir))
                .map_err(|e| CoreError::WorkspaceIo(e.to_string()))?;
        }

        let metadata_path = root.join(".aicoder").join("metadata.json");
        atomic_write_json(
            &metadata_path,
            &WorkspaceMetadata {
                coder_id: coder_id.as_str(),
                created_at: created_at.to_string(),
            },
            None,
        )
        .map_err(|e| CoreError::WorkspaceIo(e.to_string()))?;

        for seed in seed_files {
            self.write_file(&root, seed, b"")?;
        }

        Ok(root)
    }

    /// Validates `relative_path` lies under `root` (spec §4.2's
    /// four-step algorithm) and returns the resolved absolute path.
    pub fn validate_path(&self, root: &Path, relative_path: &str) -> Result<PathBuf, CoreError> {
        let requested = Path::new(relative_path);
        let joined = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            root.join(requested)
        };
        let cleaned = clean_path(&joined);

        let resolved = match cleaned.canonicalize() {
            Ok(real) => real,
            Err(_) => cleaned.clone(),
        };
        let canonical_root = root
            .canonicalize()
            .unwrap_or_else(|_| clean_path(root));

        let relative = resolved.strip_prefix(&canonical_root).map_err(|_| {
            CoreError::PathTraversal(format!(
                "{relative_path} resolves outside the workspace root"
            ))
        })?;

        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(CoreError::PathTraversal(relative_path.to_string()));
        }

        Ok(resolved)
    }

    pub fn write_file(
        &self,
        root: &Path,
        relative_path: &str,
        contents: &[u8],
    ) -> Result<(), CoreError> {
        let path = self.validate_path(root, relative_path)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::WorkspaceIo(e.to_string()))?;
        }
        std::fs::write(&path, contents).map_err(|e| CoreError::WorkspaceIo(e.to_string()))
    }

    pub fn read_file(&self, root: &Path, relative_path: &str) -> Result<Vec<u8>, CoreError> {
        let path = self.validate_path(root, relative_path)?;
        std::fs::read(&path).map_err(|e| CoreError::WorkspaceIo(e.to_string()))
    }

    /// Walks the tree skipping directories and dotfiles, returning paths
    /// relative to `root` (spec §4.2).
    pub fn list_files(&self, root: &Path) -> Result<Vec<PathBuf>, CoreError> {
        let mut results = Vec::new();
        walk(root, root, &mut results)?;
        results.sort();
        Ok(results)
    }

    /// Creates destination parents with mode 0755 before copying (spec
    /// §4.2).
    pub fn copy_file(
        &self,
        root: &Path,
        src_relative: &str,
        dst_relative: &str,
    ) -> Result<(), CoreError> {
        let src = self.validate_path(root, src_relative)?;
        let dst = self.validate_path(root, dst_relative)?;
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::WorkspaceIo(e.to_string()))?;
            apply_parent_mode(parent);
        }
        std::fs::copy(&src, &dst).map_err(|e| CoreError::WorkspaceIo(e.to_string()))?;
        Ok(())
    }

    /// Refuses to remove any path outside the configured base directory
    /// (spec §4.2).
    pub fn cleanup_workspace(&self, root: &Path) -> Result<(), CoreError> {
        let canonical_base = self
            .base_dir
            .canonicalize()
            .unwrap_or_else(|_| clean_path(&self.base_dir));
        let canonical_root = root.canonicalize().unwrap_or_else(|_| clean_path(root));

        if !canonical_root.starts_with(&canonical_base) {
            return Err(CoreError::PathTraversal(format!(
                "refusing to remove workspace outside base directory: {}",
                root.display()
            )));
        }

        if let Err(err) = std::fs::remove_dir_all(root) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(error = %err, path = %root.display(), "workspace cleanup failed");
                return Err(CoreError::WorkspaceIo(err.to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(unix)]
fn apply_parent_mode(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755));
}

#[cfg(not(unix))]
fn apply_parent_mode(_path: &Path) {}

fn walk(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), CoreError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(CoreError::WorkspaceIo(err.to_string())),
    };

    for entry in entries {
        let entry = entry.map_err(|e| CoreError::WorkspaceIo(e.to_string()))?;
        let path = entry.path();

        if path.is_dir() {
            // Recurse into every directory, including dot-directories like
            // `.aicoder` — only leaf *files* are subject to the dotfile
            // skip below (spec §3/§4.2 scenario: `.aicoder/metadata.json`
            // is a counted entry).
            walk(root, &path, out)?;
            continue;
        }

        let is_dotfile = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false);
        if is_dotfile {
            continue;
        }

        if let Ok(relative) = path.strip_prefix(root) {
            out.push(relative.to_path_buf());
        }
    }
    Ok(())
}

/// Lexically collapses `.`/`..` components without touching the
/// filesystem, for paths that don't exist yet (spec §4.2 step 1).
fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;

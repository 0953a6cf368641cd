// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local-shell provider adapter (spec §4.3).

use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use brummer_core::provider::{ProviderCapabilities, ProviderResult, ProviderUpdate};
use tokio::process::Command;
use tokio::sync::mpsc;

use super::{single_shot_stream, GenerateOptions, Provider, ProviderError, PROVIDER_TIMEOUT};

#[derive(Debug, Clone)]
pub struct LocalShellProvider {
    shell: String,
    working_dir: Option<PathBuf>,
}

impl LocalShellProvider {
    pub fn new(working_dir: Option<PathBuf>) -> Self {
        let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/bash".to_string());
        Self { shell, working_dir }
    }

    fn is_single_line(prompt: &str) -> bool {
        !prompt.trim_end_matches('\n').contains('\n')
    }

    async fn run(&self, prompt: &str) -> Result<ProviderResult, ProviderError> {
        let output = if Self::is_single_line(prompt) {
            Command::new(&self.shell)
                .arg("-c")
                .arg(prompt)
                .current_dir_opt(&self.working_dir)
                .output()
        } else {
            let mut script = tempfile::NamedTempFile::new()?;
            script.write_all(prompt.as_bytes())?;
            script.flush()?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(script.path(), std::fs::Permissions::from_mode(0o755))?;
            }
            let path = script.into_temp_path();
            let result = Command::new(&self.shell)
                .arg(&path)
                .current_dir_opt(&self.working_dir)
                .output();
            let output = tokio::time::timeout(PROVIDER_TIMEOUT, result)
                .await
                .map_err(|_| ProviderError::Timeout(PROVIDER_TIMEOUT))??;
            drop(path);
            return Ok(output_to_result(output));
        };

        let output = tokio::time::timeout(PROVIDER_TIMEOUT, output)
            .await
            .map_err(|_| ProviderError::Timeout(PROVIDER_TIMEOUT))??;
        Ok(output_to_result(output))
    }
}

fn output_to_result(output: std::process::Output) -> ProviderResult {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let code = stdout.to_string();
    let summary = format!(
        "exit code {}{}",
        output.status.code().unwrap_or(-1),
        if stderr.is_empty() {
            String::new()
        } else {
            format!(", stderr: {stderr}")
        }
    );
    ProviderResult {
        code,
        summary,
        tokens: None,
        model: None,
        finish_reason: Some(if output.status.success() {
            "stop".to_string()
        } else {
            "error".to_string()
        }),
    }
}

/// Small extension so `current_dir` can be applied conditionally without
/// repeating the builder chain.
trait CommandExt {
    fn current_dir_opt(&mut self, dir: &Option<PathBuf>) -> &mut Command;
}

impl CommandExt for Command {
    fn current_dir_opt(&mut self, dir: &Option<PathBuf>) -> &mut Command {
        if let Some(dir) = dir {
            self.current_dir(dir);
        }
        self
    }
}

#[async_trait]
impl Provider for LocalShellProvider {
    fn name(&self) -> &str {
        "local-shell"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            name: "local-shell".to_string(),
            max_context_tokens: 0,
            max_output_tokens: 0,
            supports_streaming: false,
            supported_models: Vec::new(),
        }
    }

    async fn generate_code(
        &self,
        prompt: &str,
        _options: &GenerateOptions,
    ) -> Result<ProviderResult, ProviderError> {
        self.run(prompt).await
    }

    async fn stream_generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<mpsc::Receiver<ProviderUpdate>, ProviderError> {
        let result = self.generate_code(prompt, options).await;
        Ok(single_shot_stream(result))
    }

    fn validate_config(&self) -> Result<(), ProviderError> {
        if self.shell.trim().is_empty() {
            return Err(ProviderError::ConfigInvalid("empty shell path".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "local_shell_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI-tool provider adapter (spec §4.3): shells out to an external
//! binary, mapping `GenerateOptions` onto configured flags.

use std::collections::HashMap;

use async_trait::async_trait;
use brummer_core::provider::{ProviderCapabilities, ProviderResult, ProviderUpdate};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::env::merge_env;

use super::{GenerateOptions, Provider, ProviderError, PROVIDER_TIMEOUT};

/// `providers.<name>.cli_tool.*` from the spec §6 config schema.
#[derive(Debug, Clone, Default)]
pub struct CliToolConfig {
    pub command: String,
    pub base_args: Vec<String>,
    /// Maps option name (`model`, `max_tokens`, `temperature`,
    /// `context_file`) to the flag the CLI tool expects.
    pub flag_mapping: HashMap<String, String>,
    pub working_dir: Option<String>,
    pub environment: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct CliToolProvider {
    name: String,
    config: CliToolConfig,
}

impl CliToolProvider {
    pub fn new(name: impl Into<String>, config: CliToolConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    fn build_args(&self, prompt: &str, options: &GenerateOptions) -> Vec<String> {
        let mut args = self.config.base_args.clone();

        let mut push_flag = |key: &str, value: String| {
            if let Some(flag) = self.config.flag_mapping.get(key) {
                args.push(flag.clone());
                args.push(value);
            }
        };

        if let Some(model) = &options.model {
            push_flag("model", model.clone());
        }
        if let Some(max_tokens) = options.max_tokens {
            push_flag("max_tokens", max_tokens.to_string());
        }
        if let Some(temperature) = options.temperature {
            push_flag("temperature", temperature.to_string());
        }
        if let Some(context_file) = &options.context_file {
            push_flag("context_file", context_file.clone());
        }
        push_flag("prompt", prompt.to_string());
        push_flag("message", prompt.to_string());

        args
    }
}

#[async_trait]
impl Provider for CliToolProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::new(&self.name)
    }

    async fn generate_code(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<ProviderResult, ProviderError> {
        let args = self.build_args(prompt, options);
        let process_env: Vec<(String, String)> = std::env::vars().collect();
        let merged_env = merge_env(&process_env, &self.config.environment);

        let mut cmd = Command::new(&self.config.command);
        cmd.args(&args);
        cmd.env_clear();
        cmd.envs(merged_env);
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        let output = tokio::time::timeout(PROVIDER_TIMEOUT, cmd.output())
            .await
            .map_err(|_| ProviderError::Timeout(PROVIDER_TIMEOUT))??;

        let mut combined = String::new();
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            combined.push_str(line);
            combined.push('\n');
        }
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            combined.push_str("[stderr] ");
            combined.push_str(line);
            combined.push('\n');
        }

        let exit_code = output.status.code().unwrap_or(-1);
        Ok(ProviderResult {
            code: combined,
            summary: format!("exit code {exit_code}"),
            tokens: None,
            model: options.model.clone(),
            finish_reason: Some(if output.status.success() {
                "stop".to_string()
            } else {
                "error".to_string()
            }),
        })
    }

    /// Streams stdout/stderr line-by-line as the process emits them,
    /// rather than waiting for exit (spec §4.3: "Streaming yields lines
    /// as they arrive").
    async fn stream_generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<mpsc::Receiver<ProviderUpdate>, ProviderError> {
        let args = self.build_args(prompt, options);
        let process_env: Vec<(String, String)> = std::env::vars().collect();
        let merged_env = merge_env(&process_env, &self.config.environment);

        let mut cmd = Command::new(&self.config.command);
        cmd.args(&args);
        cmd.env_clear();
        cmd.envs(merged_env);
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());

        let mut child = cmd.spawn()?;
        let stdout = child.stdout.take().ok_or_else(|| {
            ProviderError::Upstream("child process has no stdout pipe".to_string())
        })?;

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx.send(ProviderUpdate::Chunk(line)).await.is_err() {
                    return;
                }
            }
            match child.wait().await {
                Ok(status) if status.success() => {
                    let _ = tx
                        .send(ProviderUpdate::Done(ProviderResult {
                            code: String::new(),
                            summary: "exit code 0".to_string(),
                            tokens: None,
                            model: None,
                            finish_reason: Some("stop".to_string()),
                        }))
                        .await;
                }
                Ok(status) => {
                    let _ = tx
                        .send(ProviderUpdate::Error(format!(
                            "exit code {}",
                            status.code().unwrap_or(-1)
                        )))
                        .await;
                }
                Err(err) => {
                    let _ = tx.send(ProviderUpdate::Error(err.to_string())).await;
                }
            }
        });

        Ok(rx)
    }

    fn validate_config(&self) -> Result<(), ProviderError> {
        which::which(&self.config.command).map_err(|_| {
            ProviderError::ConfigInvalid(format!(
                "command `{}` is not resolvable on PATH",
                self.config.command
            ))
        })?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "cli_tool_tests.rs"]
mod tests;

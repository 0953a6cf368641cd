// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Provider` trait and its four variants (spec §4.3): HTTP API, CLI
//! tool, local shell, and mock.

mod cli_tool;
mod http_api;
mod local_shell;
mod mock;

pub use cli_tool::CliToolProvider;
pub use http_api::HttpApiProvider;
pub use local_shell::LocalShellProvider;
pub use mock::MockProvider;

use std::time::Duration;

use async_trait::async_trait;
use brummer_core::provider::{ProviderCapabilities, ProviderResult, ProviderUpdate};
use thiserror::Error;
use tokio::sync::mpsc;

/// Every provider call is bounded at 2 minutes (spec §4.3, §5).
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("invalid provider configuration: {0}")]
    ConfigInvalid(String),
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-call options (spec §4.3's `{model, max_tokens, temperature,
/// message, prompt, context_file}` mapping).
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub context_file: Option<String>,
}

/// A pluggable backend that turns prompts into text. See the module docs
/// for the four shipping variants.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    fn capabilities(&self) -> ProviderCapabilities;

    async fn generate_code(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<ProviderResult, ProviderError>;

    /// Streaming variant. Providers without native streaming emit the
    /// full result as a single `Update` (spec §4.3).
    async fn stream_generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<mpsc::Receiver<ProviderUpdate>, ProviderError>;

    fn validate_config(&self) -> Result<(), ProviderError>;
}

/// Wraps a non-streaming result as a one-shot streaming channel, for
/// providers that don't implement streaming natively.
pub(crate) fn single_shot_stream(result: Result<ProviderResult, ProviderError>) -> mpsc::Receiver<ProviderUpdate> {
    let (tx, rx) = mpsc::channel(1);
    let update = match result {
        Ok(result) => ProviderUpdate::Done(result),
        Err(err) => ProviderUpdate::Error(err.to_string()),
    };
    // The channel has capacity 1 and nothing else sends, so this cannot
    // block; dropping the receiver is the only failure mode and is a
    // no-op for the caller.
    let _ = tx.try_send(update);
    rx
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic provider used by tests (spec §4.3).

use async_trait::async_trait;
use brummer_core::provider::{ProviderCapabilities, ProviderResult, ProviderUpdate};
use tokio::sync::mpsc;

use super::{single_shot_stream, GenerateOptions, Provider, ProviderError};

#[derive(Debug, Clone)]
pub struct MockProvider {
    fixed_code: String,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            fixed_code: "// mock provider output\n".to_string(),
        }
    }

    pub fn with_fixed_code(code: impl Into<String>) -> Self {
        Self {
            fixed_code: code.into(),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            name: "mock".to_string(),
            max_context_tokens: 1_000_000,
            max_output_tokens: 1_000_000,
            supports_streaming: true,
            supported_models: vec!["mock-1".to_string()],
        }
    }

    async fn generate_code(
        &self,
        _prompt: &str,
        _options: &GenerateOptions,
    ) -> Result<ProviderResult, ProviderError> {
        Ok(ProviderResult {
            code: self.fixed_code.clone(),
            summary: "mock generation complete".to_string(),
            tokens: Some(0),
            model: Some("mock-1".to_string()),
            finish_reason: Some("stop".to_string()),
        })
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
        Ok(())
    }
}

#[cfg(test)]
#[path = "mock_tests.rs"]
mod tests;

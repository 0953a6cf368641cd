// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP-API provider adapter (spec §4.3). Vendor wire formats are out of
//! scope (spec §1); this adapter only fixes the *shape* of the request
//! and response envelope, which a concrete vendor integration would
//! adapt in its own deserializer.

use async_trait::async_trait;
use brummer_core::provider::{ProviderCapabilities, ProviderResult, ProviderUpdate};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{single_shot_stream, GenerateOptions, Provider, ProviderError, PROVIDER_TIMEOUT};

#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    pub url: String,
    /// Resolved once at construction: an inline key, or the value of
    /// `api_key_env` read from the process environment.
    pub api_key: Option<String>,
    pub default_model: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpstreamRequest<'a> {
    prompt: &'a str,
    model: Option<&'a str>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct UpstreamResponse {
    code: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    tokens: Option<u32>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    finish_reason: Option<String>,
}

pub struct HttpApiProvider {
    name: String,
    config: HttpApiConfig,
    client: reqwest::Client,
}

impl HttpApiProvider {
    pub fn new(name: impl Into<String>, config: HttpApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            name: name.into(),
            config,
            client,
        }
    }

    /// Resolves the API key from an inline config value or, if absent,
    /// the named environment variable (spec §4.3, §6).
    pub fn api_key_from_env_or_config(inline: Option<String>, env_var: &str) -> Option<String> {
        inline.or_else(|| std::env::var(env_var).ok())
    }
}

#[async_trait]
impl Provider for HttpApiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> ProviderCapabilities {
        let mut caps = ProviderCapabilities::new(&self.name);
        caps.supports_streaming = false;
        if let Some(model) = &self.config.default_model {
            caps.supported_models.push(model.clone());
        }
        caps
    }

    async fn generate_code(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<ProviderResult, ProviderError> {
        let model = options.model.as_deref().or(self.config.default_model.as_deref());
        let body = UpstreamRequest {
            prompt,
            model,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let mut request = self.client.post(&self.config.url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|err| ProviderError::Upstream(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Upstream(format!(
                "upstream returned HTTP {}",
                response.status()
            )));
        }

        let parsed: UpstreamResponse = response
            .json()
            .await
            .map_err(|err| ProviderError::Upstream(err.to_string()))?;

        Ok(ProviderResult {
            code: parsed.code,
            summary: parsed.summary,
            tokens: parsed.tokens,
            model: parsed.model,
            finish_reason: parsed.finish_reason,
        })
    }

    /// Non-native streaming degrades to a single `Update` carrying the
    /// full result (spec §4.3).
    async fn stream_generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<mpsc::Receiver<ProviderUpdate>, ProviderError> {
        let result = self.generate_code(prompt, options).await;
        Ok(single_shot_stream(result))
    }

    fn validate_config(&self) -> Result<(), ProviderError> {
        if self.config.url.trim().is_empty() {
            return Err(ProviderError::ConfigInvalid("empty URL".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "http_api_tests.rs"]
mod tests;

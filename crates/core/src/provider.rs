// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider capability descriptors (C1 §4.3). The `Provider` trait itself
//! lives in `brummer-adapters` since invoking a provider is an I/O
//! operation; this crate only carries the data shared between the trait
//! contract and the registry.

use serde::{Deserialize, Serialize};

/// Which concrete mechanism a provider uses to turn a prompt into output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    HttpApi,
    CliTool,
    LocalShell,
    Mock,
}

/// What a provider reports about itself, per spec §4.3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    pub name: String,
    pub max_context_tokens: u32,
    pub max_output_tokens: u32,
    pub supports_streaming: bool,
    pub supported_models: Vec<String>,
}

impl ProviderCapabilities {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_context_tokens: 0,
            max_output_tokens: 0,
            supports_streaming: false,
            supported_models: Vec::new(),
        }
    }
}

/// The unified result of a single (non-streaming) provider invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    pub code: String,
    pub summary: String,
    pub tokens: Option<u32>,
    pub model: Option<String>,
    pub finish_reason: Option<String>,
}

/// One increment of a streaming provider invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProviderUpdate {
    Chunk(String),
    Done(ProviderResult),
    Error(String),
}

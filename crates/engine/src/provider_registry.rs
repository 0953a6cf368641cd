// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider Registry (spec §4.3, C1 sub-component): a single-writer map
//! of named `Provider` implementations. `Register` is one-shot per name;
//! `Get` returns a typed not-found error.

use std::collections::HashMap;
use std::sync::Arc;

use brummer_adapters::Provider;
use brummer_core::CoreError;
use parking_lot::RwLock;

/// Owns every registered [`Provider`] by name. Readers (dispatching a
/// generation call) run concurrently; registration excludes all readers
/// for the duration of the insert (spec §5's reader/writer policy,
/// generalized from the coder map to this registry).
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn Provider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
        }
    }

    /// Fails with `ProviderExists` on duplicate (spec §4.1, §4.3).
    pub fn register(&self, name: impl Into<String>, provider: Arc<dyn Provider>) -> Result<(), CoreError> {
        let name = name.into();
        let mut providers = self.providers.write();
        if providers.contains_key(&name) {
            return Err(CoreError::ProviderExists(name));
        }
        providers.insert(name, provider);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Provider>, CoreError> {
        self.providers
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::UnknownProvider(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.read().keys().cloned().collect()
    }
}

#[cfg(test)]
#[path = "provider_registry_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variable merging and `${VAR}` expansion shared by the
//! Provider adapters and the PTY session (spec §4.4: "support for
//! `${VAR}` expansion from caller and OS env").

use std::collections::HashMap;
use std::env;

/// Merges `overrides` on top of `base`, later entries winning on key
/// collision, preserving `base`'s original ordering for untouched keys.
pub fn merge_env(base: &[(String, String)], overrides: &[(String, String)]) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = base.to_vec();
    for (key, value) in overrides {
        if let Some(existing) = merged.iter_mut().find(|(k, _)| k == key) {
            existing.1 = value.clone();
        } else {
            merged.push((key.clone(), value.clone()));
        }
    }
    merged
}

/// Expands `${VAR}` references in `input`, looking `VAR` up first in
/// `caller_env` (the session/provider's own env list) and falling back to
/// the OS process environment. Unresolved references are left verbatim.
pub fn expand_vars(input: &str, caller_env: &[(String, String)]) -> String {
    let lookup: HashMap<&str, &str> = caller_env
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                let resolved = lookup
                    .get(name)
                    .map(|v| v.to_string())
                    .or_else(|| env::var(name).ok());
                match resolved {
                    Some(value) => output.push_str(&value),
                    None => {
                        output.push_str("${");
                        output.push_str(name);
                        output.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                output.push_str("${");
                rest = after;
                break;
            }
        }
    }
    output.push_str(rest);
    output
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;

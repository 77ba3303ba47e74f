// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Layout reader/writer option payloads.
//!
//! The layout readers and writers own the meaning of their options. A
//! technology only carries them around, so options are kept as an opaque,
//! ordered `format -> key -> value` table of strings.

use std::collections::BTreeMap;

/// Opaque layout reader or writer options, grouped by file format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutOptions {
    formats: BTreeMap<String, BTreeMap<String, String>>,
}

impl LayoutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets an option value for a format (e.g. `("gds2", "box-mode")`)
    pub fn get(&self, format: &str, key: &str) -> Option<&str> {
        self.formats
            .get(format)
            .and_then(|opts| opts.get(key))
            .map(String::as_str)
    }

    /// Sets an option value, replacing a previous one
    pub fn set(&mut self, format: impl Into<String>, key: impl Into<String>, value: impl Into<String>) {
        self.formats
            .entry(format.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Removes an option; drops the format block when it becomes empty
    pub fn unset(&mut self, format: &str, key: &str) -> Option<String> {
        let opts = self.formats.get_mut(format)?;
        let removed = opts.remove(key);
        if opts.is_empty() {
            self.formats.remove(format);
        }
        removed
    }

    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }

    /// All options of one format, in key order
    pub fn options(&self, format: &str) -> impl Iterator<Item = (&str, &str)> {
        self.formats
            .get(format)
            .into_iter()
            .flat_map(|opts| opts.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

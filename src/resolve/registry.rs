//! Namespace prefix registry
//!
//! Maps namespace keys (e.g. `oscal-catalog`) to short prefixes. Assignment is
//! append-only and first-seen-wins, so prefixes are deterministic for a fixed
//! document order. The registry is owned by the batch and lent to one
//! document at a time.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::TranslateConfig;

#[derive(Debug, Clone, Default)]
pub struct NamespaceRegistry {
    /// key -> prefix
    prefixes: BTreeMap<String, String>,
    /// keys in registration order
    order: Vec<String>,
    /// last generated prefix number
    generated: usize,
    /// keys touched by the current document
    used: BTreeSet<String>,
    default_namespace_name: String,
}

impl NamespaceRegistry {
    pub fn new(default_namespace_name: impl Into<String>) -> Self {
        Self {
            default_namespace_name: default_namespace_name.into(),
            ..Default::default()
        }
    }

    /// Registry seeded with the configured prefixes
    pub fn from_config(config: &TranslateConfig) -> Self {
        let mut registry = Self::new(config.naming.default_namespace_name.clone());
        for (key, prefix) in &config.namespaces.prefixes {
            registry.preregister(key, prefix);
        }
        registry
    }

    /// Bind a key to a fixed prefix. Ignored if the key is already bound.
    pub fn preregister(&mut self, key: &str, prefix: &str) {
        if self.prefixes.contains_key(key) {
            return;
        }
        let prefix = prefix.trim_end_matches(':');
        self.prefixes.insert(key.to_string(), prefix.to_string());
        self.order.push(key.to_string());
    }

    /// Prefix for `key`, allocating `nNN` on first sight. Marks the key used.
    pub fn register(&mut self, key: &str) -> String {
        self.used.insert(key.to_string());
        if let Some(prefix) = self.prefixes.get(key) {
            return prefix.clone();
        }

        let prefix = loop {
            self.generated += 1;
            let candidate = format!("n{:02}", self.generated);
            if !self.prefixes.values().any(|p| *p == candidate) {
                break candidate;
            }
        };
        tracing::debug!("Registered namespace {} -> {}", self.namespace_name(key), prefix);
        self.prefixes.insert(key.to_string(), prefix.clone());
        self.order.push(key.to_string());
        prefix
    }

    pub fn prefix_for(&self, key: &str) -> Option<&str> {
        self.prefixes.get(key).map(String::as_str)
    }

    pub fn key_for_prefix(&self, prefix: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|(_, p)| p.as_str() == prefix)
            .map(|(k, _)| k.as_str())
    }

    /// Display name of a key; the empty key is the shared namespace
    pub fn namespace_name<'a>(&'a self, key: &'a str) -> &'a str {
        if key.is_empty() {
            &self.default_namespace_name
        } else {
            key
        }
    }

    /// URI of a namespace under a package base (`base` ends with `/`)
    pub fn uri(&self, base: &str, key: &str) -> String {
        format!("{}{}", base, self.namespace_name(key))
    }

    /// Start tracking a new document's used keys
    pub fn begin_document(&mut self) {
        self.used.clear();
    }

    pub fn used_keys(&self) -> &BTreeSet<String> {
        &self.used
    }

    /// (key, prefix) in registration order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order
            .iter()
            .filter_map(move |k| self.prefixes.get(k).map(|p| (k.as_str(), p.as_str())))
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

//! Key manifest: the explicit registration list of every state key a world uses.
//!
//! The manifest is built once at startup (usually from `manifest.toml`) and seeds the
//! game state with initial values. Content validation checks every key referenced
//! by quest definitions against it.

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::keys::{CounterKey, FlagKey, LabelKey};

/// Which state namespace a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyKind {
    Flag,
    Counter,
    Label,
    Variable,
}

impl Display for KeyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyKind::Flag => write!(f, "flag"),
            KeyKind::Counter => write!(f, "counter"),
            KeyKind::Label => write!(f, "label"),
            KeyKind::Variable => write!(f, "variable"),
        }
    }
}

/// Registered keys and their initial values.
///
/// Variables hold arbitrary runtime types and so are registered by name only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyManifest {
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,
    #[serde(default)]
    pub counters: BTreeMap<String, i32>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub variables: Vec<String>,
}

impl KeyManifest {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn register_flag(mut self, key: FlagKey, initial: bool) -> Self {
        self.flags.insert(key.name().to_string(), initial);
        self
    }

    #[must_use]
    pub fn register_counter(mut self, key: CounterKey, initial: i32) -> Self {
        self.counters.insert(key.name().to_string(), initial);
        self
    }

    #[must_use]
    pub fn register_label(mut self, key: LabelKey, initial: impl Into<String>) -> Self {
        self.labels.insert(key.name().to_string(), initial.into());
        self
    }

    #[must_use]
    pub fn register_variable(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.variables.contains(&name) {
            self.variables.push(name);
        }
        self
    }

    /// Returns true if `name` is registered in the `kind` namespace.
    pub fn is_registered(&self, kind: KeyKind, name: &str) -> bool {
        match kind {
            KeyKind::Flag => self.flags.contains_key(name),
            KeyKind::Counter => self.counters.contains_key(name),
            KeyKind::Label => self.labels.contains_key(name),
            KeyKind::Variable => self.variables.iter().any(|v| v == name),
        }
    }

    /// Total number of registered keys across all namespaces.
    pub fn len(&self) -> usize {
        self.flags.len() + self.counters.len() + self.labels.len() + self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Shared data model for Tale content: typed state keys, the key manifest and quest definitions.

pub mod defs;
pub mod keys;
pub mod manifest;
pub mod validate;

pub use defs::*;
pub use keys::{CounterKey, FlagKey, Key, LabelKey, Namespace, StoreKey, VariableKey};
pub use manifest::{KeyKind, KeyManifest};
pub use validate::{ValidationError, validate_quests};

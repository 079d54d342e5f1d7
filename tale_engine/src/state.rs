//! Game state store.
//!
//! `GameState` holds the four independent key spaces that make up the mutable truth of
//! a running session: flags, counters, labels and variables. Absence is never an
//! error here. Lookups return `Option`, and operations that would have to invent a
//! missing entry (incrementing, toggling) return `false` instead, so a typo in authored
//! content shows up as a failed operation rather than silently created state.
//!
//! The store has a single logical owner (the turn loop) and does no locking.

use std::any::Any;
use std::collections::HashMap;

use log::{debug, info};
use tale_data::keys::{CounterSpace, FlagSpace, LabelSpace, VariableSpace};
use tale_data::{KeyManifest, StoreKey};

/// Complete mutable gameplay state for one session.
#[derive(Debug, Default)]
pub struct GameState {
    pub flags: Flags,
    pub counters: Counters,
    pub labels: Labels,
    pub variables: Variables,
}

impl GameState {
    pub fn new() -> GameState {
        GameState::default()
    }

    /// Create a state store seeded with the initial values of every registered key.
    pub fn from_manifest(manifest: &KeyManifest) -> GameState {
        let mut state = GameState::new();
        for (name, value) in &manifest.flags {
            state.flags.set(name, *value);
        }
        for (name, value) in &manifest.counters {
            state.counters.set(name, *value);
        }
        for (name, value) in &manifest.labels {
            state.labels.set(name, value.clone());
        }
        info!(
            "game state seeded: {} flags, {} counters, {} labels",
            state.flags.len(),
            state.counters.len(),
            state.labels.len()
        );
        state
    }

    /// Wipe every namespace. Intended for test isolation only.
    pub fn clear_all(&mut self) {
        self.flags.clear();
        self.counters.clear();
        self.labels.clear();
        self.variables.clear();
        debug!("game state cleared");
    }
}

/// Boolean flags (name -> bool).
#[derive(Debug, Default, Clone)]
pub struct Flags {
    values: HashMap<String, bool>,
}

impl Flags {
    pub fn set(&mut self, key: impl StoreKey<FlagSpace>, value: bool) {
        self.values.insert(key.key_name().to_string(), value);
    }

    pub fn try_get(&self, key: impl StoreKey<FlagSpace>) -> Option<bool> {
        self.values.get(key.key_name()).copied()
    }

    /// Returns true if the flag exists *and* is set.
    pub fn is_set(&self, key: impl StoreKey<FlagSpace>) -> bool {
        self.try_get(key).unwrap_or(false)
    }

    pub fn has(&self, key: impl StoreKey<FlagSpace>) -> bool {
        self.values.contains_key(key.key_name())
    }

    /// Remove a flag, returning its last value if it existed.
    pub fn remove(&mut self, key: impl StoreKey<FlagSpace>) -> Option<bool> {
        self.values.remove(key.key_name())
    }

    /// Invert an existing flag. Returns false (and changes nothing) if the flag doesn't exist.
    pub fn try_toggle(&mut self, key: impl StoreKey<FlagSpace>) -> bool {
        match self.values.get_mut(key.key_name()) {
            Some(value) => {
                *value = !*value;
                true
            },
            None => false,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

/// Integer counters (name -> i32). Decrements floor at zero.
#[derive(Debug, Default, Clone)]
pub struct Counters {
    values: HashMap<String, i32>,
}

impl Counters {
    pub fn set(&mut self, key: impl StoreKey<CounterSpace>, value: i32) {
        self.values.insert(key.key_name().to_string(), value);
    }

    pub fn try_get(&self, key: impl StoreKey<CounterSpace>) -> Option<i32> {
        self.values.get(key.key_name()).copied()
    }

    pub fn has(&self, key: impl StoreKey<CounterSpace>) -> bool {
        self.values.contains_key(key.key_name())
    }

    pub fn remove(&mut self, key: impl StoreKey<CounterSpace>) -> Option<i32> {
        self.values.remove(key.key_name())
    }

    /// Add one to an existing counter. Missing counters are not created.
    pub fn try_increment(&mut self, key: impl StoreKey<CounterSpace>) -> bool {
        self.try_increment_by(key, 1)
    }

    /// A negative `amount` is treated as a decrement and floors at zero.
    pub fn try_increment_by(&mut self, key: impl StoreKey<CounterSpace>, amount: i32) -> bool {
        if amount < 0 {
            return self.try_decrement_by(key, amount.saturating_neg());
        }
        match self.values.get_mut(key.key_name()) {
            Some(value) => {
                *value = value.saturating_add(amount);
                true
            },
            None => false,
        }
    }

    /// Subtract one from an existing counter, never going below zero.
    pub fn try_decrement(&mut self, key: impl StoreKey<CounterSpace>) -> bool {
        self.try_decrement_by(key, 1)
    }

    /// A negative `amount` is treated as an increment.
    pub fn try_decrement_by(&mut self, key: impl StoreKey<CounterSpace>, amount: i32) -> bool {
        if amount < 0 {
            return self.try_increment_by(key, amount.saturating_neg());
        }
        match self.values.get_mut(key.key_name()) {
            Some(value) => {
                *value = value.saturating_sub(amount).max(0);
                true
            },
            None => false,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

/// String labels (name -> String).
#[derive(Debug, Default, Clone)]
pub struct Labels {
    values: HashMap<String, String>,
}

impl Labels {
    pub fn set(&mut self, key: impl StoreKey<LabelSpace>, value: impl Into<String>) {
        self.values.insert(key.key_name().to_string(), value.into());
    }

    pub fn try_get(&self, key: impl StoreKey<LabelSpace>) -> Option<&str> {
        self.values.get(key.key_name()).map(String::as_str)
    }

    pub fn has(&self, key: impl StoreKey<LabelSpace>) -> bool {
        self.values.contains_key(key.key_name())
    }

    pub fn remove(&mut self, key: impl StoreKey<LabelSpace>) -> Option<String> {
        self.values.remove(key.key_name())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

/// Arbitrarily typed variables (name -> any `Send + Sync` value).
///
/// Reads are typed: asking for a variable as the wrong type behaves like asking for a
/// missing one.
#[derive(Default)]
pub struct Variables {
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for Variables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

impl Variables {
    pub fn set<T: Any + Send + Sync>(&mut self, key: impl StoreKey<VariableSpace>, value: T) {
        self.values.insert(key.key_name().to_string(), Box::new(value));
    }

    pub fn try_get<T: Any>(&self, key: impl StoreKey<VariableSpace>) -> Option<&T> {
        self.values.get(key.key_name()).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn try_get_mut<T: Any>(&mut self, key: impl StoreKey<VariableSpace>) -> Option<&mut T> {
        self.values.get_mut(key.key_name()).and_then(|v| v.downcast_mut::<T>())
    }

    pub fn has(&self, key: impl StoreKey<VariableSpace>) -> bool {
        self.values.contains_key(key.key_name())
    }

    pub fn remove(&mut self, key: impl StoreKey<VariableSpace>) -> bool {
        self.values.remove(key.key_name()).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tale_data::{CounterKey, FlagKey, LabelKey};

    const LANTERN_LIT: FlagKey = FlagKey::new("lantern_lit");
    const GEMS: CounterKey = CounterKey::new("gems");
    const MOOD: LabelKey = LabelKey::new("guard_mood");

    #[test]
    fn absent_keys_are_not_errors() {
        let state = GameState::new();
        assert_eq!(state.flags.try_get("nope"), None);
        assert_eq!(state.counters.try_get("nope"), None);
        assert_eq!(state.labels.try_get("nope"), None);
        assert!(state.variables.try_get::<u8>("nope").is_none());
        assert!(!state.flags.is_set(LANTERN_LIT));
    }

    #[test]
    fn counters_do_not_auto_create() {
        let mut state = GameState::new();
        assert!(!state.counters.try_increment(GEMS));
        assert!(!state.counters.try_decrement(GEMS));
        assert!(!state.counters.has(GEMS));
    }

    #[test]
    fn counter_decrement_floors_at_zero() {
        let mut state = GameState::new();
        state.counters.set(GEMS, 1);
        assert!(state.counters.try_decrement(GEMS));
        assert!(state.counters.try_decrement(GEMS));
        assert_eq!(state.counters.try_get(GEMS), Some(0));
        assert!(state.counters.try_increment_by(GEMS, 5));
        assert!(state.counters.try_decrement_by(GEMS, 9));
        assert_eq!(state.counters.try_get(GEMS), Some(0));
    }

    #[test]
    fn negative_amounts_change_direction() {
        let mut state = GameState::new();
        state.counters.set(GEMS, 2);
        assert!(state.counters.try_increment_by(GEMS, -5));
        assert_eq!(state.counters.try_get(GEMS), Some(0));

        state.counters.set(GEMS, 2);
        assert!(state.counters.try_decrement_by(GEMS, -5));
        assert_eq!(state.counters.try_get(GEMS), Some(7));

        state.counters.set(GEMS, 3);
        assert!(state.counters.try_increment_by(GEMS, i32::MIN));
        assert_eq!(state.counters.try_get(GEMS), Some(0));
        assert!(!state.counters.try_decrement_by("missing", -1));
    }

    #[test]
    fn toggle_requires_existing_flag() {
        let mut state = GameState::new();
        assert!(!state.flags.try_toggle(LANTERN_LIT));
        state.flags.set(LANTERN_LIT, false);
        assert!(state.flags.try_toggle(LANTERN_LIT));
        assert_eq!(state.flags.try_get(LANTERN_LIT), Some(true));
        assert_eq!(state.flags.remove(LANTERN_LIT), Some(true));
        assert!(!state.flags.has(LANTERN_LIT));
    }

    #[test]
    fn labels_and_raw_string_keys_share_a_namespace() {
        let mut state = GameState::new();
        state.labels.set(MOOD, "suspicious");
        assert_eq!(state.labels.try_get("guard_mood"), Some("suspicious"));
        assert_eq!(state.labels.remove(MOOD).as_deref(), Some("suspicious"));
    }

    #[test]
    fn variables_are_typed() {
        #[derive(Debug, PartialEq)]
        struct Weather {
            raining: bool,
        }

        let mut state = GameState::new();
        state.variables.set("weather", Weather { raining: true });
        assert_eq!(state.variables.try_get::<Weather>("weather"), Some(&Weather { raining: true }));
        assert!(state.variables.try_get::<String>("weather").is_none());
        if let Some(w) = state.variables.try_get_mut::<Weather>("weather") {
            w.raining = false;
        }
        assert_eq!(state.variables.try_get::<Weather>("weather"), Some(&Weather { raining: false }));
        assert!(state.variables.remove("weather"));
        assert!(!state.variables.remove("weather"));
    }

    #[test]
    fn clear_all_wipes_every_namespace() {
        let mut state = GameState::new();
        state.flags.set("f", true);
        state.counters.set("c", 2);
        state.labels.set("l", "x");
        state.variables.set("v", 1_u64);
        state.clear_all();
        assert!(state.flags.is_empty() && state.counters.is_empty());
        assert!(state.labels.is_empty() && state.variables.is_empty());
    }

    #[test]
    fn manifest_seeds_initial_values() {
        let manifest = KeyManifest::new()
            .register_flag(LANTERN_LIT, true)
            .register_counter(GEMS, 3)
            .register_label(MOOD, "calm");
        let state = GameState::from_manifest(&manifest);
        assert_eq!(state.flags.try_get(LANTERN_LIT), Some(true));
        assert_eq!(state.counters.try_get(GEMS), Some(3));
        assert_eq!(state.labels.try_get(MOOD), Some("calm"));
    }
}

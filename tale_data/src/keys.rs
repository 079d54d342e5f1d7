//! Typed state keys.
//!
//! Every key in the game state is ultimately a string, but authored content refers to
//! keys through constants such as `const LAMP_LIT: FlagKey = FlagKey::new("lamp_lit");`
//! so a misspelled key is a compile error and a counter key can't be handed to the
//! flag namespace by accident.

use std::fmt;
use std::marker::PhantomData;

/// Marker for one of the four state namespaces.
pub trait Namespace {
    /// Human-readable namespace name, used in logs and validation messages.
    const NAME: &'static str;
}

/// Boolean flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagSpace {}
/// Non-negative integer counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterSpace {}
/// String labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelSpace {}
/// Arbitrarily typed variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableSpace {}

impl Namespace for FlagSpace {
    const NAME: &'static str = "flag";
}
impl Namespace for CounterSpace {
    const NAME: &'static str = "counter";
}
impl Namespace for LabelSpace {
    const NAME: &'static str = "label";
}
impl Namespace for VariableSpace {
    const NAME: &'static str = "variable";
}

/// A state key bound to a namespace at compile time.
pub struct Key<N: Namespace> {
    name: &'static str,
    _space: PhantomData<N>,
}

pub type FlagKey = Key<FlagSpace>;
pub type CounterKey = Key<CounterSpace>;
pub type LabelKey = Key<LabelSpace>;
pub type VariableKey = Key<VariableSpace>;

impl<N: Namespace> Key<N> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _space: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub fn namespace(&self) -> &'static str {
        N::NAME
    }
}

// manual impls: derives would put bounds on `N`
impl<N: Namespace> Clone for Key<N> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<N: Namespace> Copy for Key<N> {}
impl<N: Namespace> PartialEq for Key<N> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl<N: Namespace> Eq for Key<N> {}
impl<N: Namespace> std::hash::Hash for Key<N> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}
impl<N: Namespace> fmt::Debug for Key<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", N::NAME, self.name)
    }
}
impl<N: Namespace> fmt::Display for Key<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
impl<N: Namespace> AsRef<str> for Key<N> {
    fn as_ref(&self) -> &str {
        self.name
    }
}

/// Anything that can address an entry in namespace `N`.
///
/// Raw strings are accepted in every namespace (the narrative interpreter passes keys
/// through as plain strings); a typed [`Key`] only in its own.
pub trait StoreKey<N: Namespace> {
    fn key_name(&self) -> &str;
}

impl<N: Namespace> StoreKey<N> for Key<N> {
    fn key_name(&self) -> &str {
        self.name
    }
}
impl<N: Namespace> StoreKey<N> for &Key<N> {
    fn key_name(&self) -> &str {
        self.name
    }
}
impl<N: Namespace> StoreKey<N> for &str {
    fn key_name(&self) -> &str {
        self
    }
}
impl<N: Namespace> StoreKey<N> for String {
    fn key_name(&self) -> &str {
        self.as_str()
    }
}
impl<N: Namespace> StoreKey<N> for &String {
    fn key_name(&self) -> &str {
        self.as_str()
    }
}

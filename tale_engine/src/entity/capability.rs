//! Capability identities.
//!
//! A capability is a trait describing one thing an entity can do (`dyn Openable`,
//! `dyn Usable`, ...). The capability trait object type is the key under which
//! behaviours are stored on an entity. Capabilities are declared with the
//! [`capability!`](crate::capability) macro, which also records any capabilities that
//! must already be attached before this one can be.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use thiserror::Error;

/// A capability contract that behaviours can be attached under.
///
/// Usually implemented for a trait object type via [`capability!`](crate::capability).
pub trait Capability: 'static {
    /// Human-readable name used in logs and error messages.
    const NAME: &'static str;

    /// Capabilities that must already be attached to an entity before this one.
    fn prerequisites() -> Vec<CapabilityId> {
        Vec::new()
    }
}

/// Runtime identity of a capability type.
#[derive(Clone, Copy)]
pub struct CapabilityId {
    type_id: TypeId,
    storage_type: TypeId,
    name: &'static str,
    prerequisites: fn() -> Vec<CapabilityId>,
}

impl CapabilityId {
    pub fn of<T: ?Sized + Capability>() -> CapabilityId {
        CapabilityId {
            type_id: TypeId::of::<T>(),
            storage_type: TypeId::of::<Box<T>>(),
            name: T::NAME,
            prerequisites: T::prerequisites,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn prerequisites(&self) -> Vec<CapabilityId> {
        (self.prerequisites)()
    }

    pub(crate) fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// True if `instance` is a behaviour boxed for this capability (see [`erase`]).
    pub(crate) fn accepts(&self, instance: &dyn Any) -> bool {
        instance.type_id() == self.storage_type
    }
}

impl PartialEq for CapabilityId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for CapabilityId {}

impl Hash for CapabilityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CapabilityId({})", self.name)
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Type-erase a behaviour for [`Entity::add_behaviour_erased`](super::Entity::add_behaviour_erased).
pub fn erase<T: ?Sized + Capability>(behaviour: Box<T>) -> Box<dyn Any> {
    Box::new(behaviour)
}

/// Authoring errors raised while attaching behaviours.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BehaviourError {
    #[error("cannot attach '{capability}' to {entity}: requires '{requires}' to be attached first")]
    MissingPrerequisite {
        entity: String,
        capability: &'static str,
        requires: &'static str,
    },
    #[error("cannot attach behaviour to {entity}: instance does not implement '{capability}'")]
    TypeMismatch { entity: String, capability: &'static str },
}

/// Declare a trait object type as a capability.
///
/// ```
/// use tale_engine::capability;
///
/// pub trait Glows {
///     fn brightness(&self) -> u8;
/// }
/// pub trait Flickers {
///     fn flicker(&self);
/// }
///
/// capability!(dyn Glows, "glows");
/// capability!(dyn Flickers, "flickers", requires [dyn Glows]);
/// ```
#[macro_export]
macro_rules! capability {
    ($cap:ty, $name:literal) => {
        impl $crate::entity::Capability for $cap {
            const NAME: &'static str = $name;
        }
    };
    ($cap:ty, $name:literal, requires [$($req:ty),+ $(,)?]) => {
        impl $crate::entity::Capability for $cap {
            const NAME: &'static str = $name;

            fn prerequisites() -> ::std::vec::Vec<$crate::entity::CapabilityId> {
                ::std::vec![$($crate::entity::CapabilityId::of::<$req>()),+]
            }
        }
    };
}

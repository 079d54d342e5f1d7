//! Entities and their capability registry.
//!
//! An `Entity` is an id plus a bag of behaviours. Nothing about what an entity *can do*
//! is fixed by its type: a chest is an entity with `Openable` and `Lockable` behaviours
//! attached, a cursed mask one with `Equippable` and three `ReactsOnEquip` triggers.
//! The command layer asks "can this do X?" with [`Entity::try_get_behaviour`] and
//! invokes whatever it finds.
//!
//! Behaviours are owned by their entity. A behaviour that needs to refer back to its
//! owner stores the owner's [`EntityId`], never a reference.

pub mod behaviours;
pub mod capability;
pub mod verbs;

pub use capability::{BehaviourError, Capability, CapabilityId, erase};

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::Display;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::idgen::{NAMESPACE_ENTITY, new_id, uuid_from_token};

/// Stable identity of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Deterministic id for an authored symbol.
    pub fn from_symbol(symbol: &str) -> EntityId {
        EntityId(uuid_from_token(&NAMESPACE_ENTITY, symbol))
    }

    /// Random id for a runtime-spawned entity.
    pub fn random() -> EntityId {
        EntityId(new_id())
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// All instances attached under one capability, in attach order.
struct Slot {
    capability: CapabilityId,
    instances: Vec<Box<dyn Any>>,
}

/// A game object: identity plus a type-indexed, multi-valued set of behaviours.
pub struct Entity {
    id: EntityId,
    symbol: String,
    name: String,
    behaviours: HashMap<TypeId, Slot>,
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("symbol", &self.symbol)
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

impl Entity {
    /// Create an authored entity; its id is derived from `symbol`.
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Entity {
        let symbol = symbol.into();
        Entity {
            id: EntityId::from_symbol(&symbol),
            symbol,
            name: name.into(),
            behaviours: HashMap::new(),
        }
    }

    /// Create an entity with a random id (spawned at runtime).
    pub fn spawned(name: impl Into<String>) -> Entity {
        let id = EntityId::random();
        Entity {
            id,
            symbol: id.to_string(),
            name: name.into(),
            behaviours: HashMap::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach a behaviour under capability `T`.
    ///
    /// # Errors
    /// - `MissingPrerequisite` if a capability `T` requires isn't attached yet
    pub fn add_behaviour<T: ?Sized + Capability>(&mut self, behaviour: Box<T>) -> Result<(), BehaviourError> {
        self.attach(CapabilityId::of::<T>(), erase(behaviour))
    }

    /// Attach a type-erased behaviour (see [`erase`]) under `capability`.
    ///
    /// # Errors
    /// - `TypeMismatch` if `behaviour` wasn't boxed for `capability`
    /// - `MissingPrerequisite` as for [`Entity::add_behaviour`]
    pub fn add_behaviour_erased(
        &mut self,
        capability: CapabilityId,
        behaviour: Box<dyn Any>,
    ) -> Result<(), BehaviourError> {
        if !capability.accepts(behaviour.as_ref()) {
            let err = BehaviourError::TypeMismatch {
                entity: self.to_string(),
                capability: capability.name(),
            };
            warn!("{err}");
            return Err(err);
        }
        self.attach(capability, behaviour)
    }

    fn attach(&mut self, capability: CapabilityId, behaviour: Box<dyn Any>) -> Result<(), BehaviourError> {
        if let Some(missing) = capability
            .prerequisites()
            .into_iter()
            .find(|req| !self.behaviours.contains_key(&req.type_id()))
        {
            let err = BehaviourError::MissingPrerequisite {
                entity: self.to_string(),
                capability: capability.name(),
                requires: missing.name(),
            };
            warn!("{err}");
            return Err(err);
        }
        self.behaviours
            .entry(capability.type_id())
            .or_insert_with(|| Slot {
                capability,
                instances: Vec::new(),
            })
            .instances
            .push(behaviour);
        debug!("'{}' behaviour attached to {self}", capability.name());
        Ok(())
    }

    /// Drop every behaviour attached under `T`. Returns how many were removed.
    pub fn remove_behaviour<T: ?Sized + Capability>(&mut self) -> usize {
        let Some(slot) = self.behaviours.remove(&TypeId::of::<T>()) else {
            return 0;
        };
        let removed = CapabilityId::of::<T>();
        for dependent in self.behaviours.values() {
            if dependent.capability.prerequisites().contains(&removed) {
                warn!(
                    "'{}' removed from {self} while '{}' still depends on it",
                    removed.name(),
                    dependent.capability.name()
                );
            }
        }
        debug!("{} '{}' behaviour(s) removed from {self}", slot.instances.len(), removed.name());
        slot.instances.len()
    }

    /// The first behaviour attached under `T`, if any.
    pub fn try_get_behaviour<T: ?Sized + Capability>(&self) -> Option<&T> {
        self.behaviours
            .get(&TypeId::of::<T>())?
            .instances
            .first()?
            .downcast_ref::<Box<T>>()
            .map(|b| &**b)
    }

    pub fn try_get_behaviour_mut<T: ?Sized + Capability>(&mut self) -> Option<&mut T> {
        self.behaviours
            .get_mut(&TypeId::of::<T>())?
            .instances
            .first_mut()?
            .downcast_mut::<Box<T>>()
            .map(|b| &mut **b)
    }

    pub fn has_behaviours<T: ?Sized + Capability>(&self) -> bool {
        self.behaviours.contains_key(&TypeId::of::<T>())
    }

    /// Every behaviour attached under `T`, in attach order.
    pub fn get_all_behaviours<T: ?Sized + Capability>(&self) -> Vec<&T> {
        self.behaviours
            .get(&TypeId::of::<T>())
            .map(|slot| {
                slot.instances
                    .iter()
                    .filter_map(|b| b.downcast_ref::<Box<T>>())
                    .map(|b| &**b)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_all_behaviours_mut<T: ?Sized + Capability>(&mut self) -> Vec<&mut T> {
        self.behaviours
            .get_mut(&TypeId::of::<T>())
            .map(|slot| {
                slot.instances
                    .iter_mut()
                    .filter_map(|b| b.downcast_mut::<Box<T>>())
                    .map(|b| &mut **b)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Capabilities currently attached, sorted by name.
    pub fn capabilities(&self) -> Vec<CapabilityId> {
        let mut caps: Vec<_> = self.behaviours.values().map(|slot| slot.capability).collect();
        caps.sort_by_key(CapabilityId::name);
        caps
    }
}

impl Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' ({})", self.name, self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability;

    trait Shines {
        fn lumens(&self) -> u32;
    }
    trait Hums {
        fn pitch(&self) -> &str;
    }
    trait Sings {
        fn song(&self) -> &str;
    }

    capability!(dyn Shines, "shines");
    capability!(dyn Hums, "hums", requires [dyn Shines]);
    capability!(dyn Sings, "sings");

    struct Bulb(u32);
    impl Shines for Bulb {
        fn lumens(&self) -> u32 {
            self.0
        }
    }

    struct Drone(&'static str);
    impl Hums for Drone {
        fn pitch(&self) -> &str {
            self.0
        }
    }

    struct Choir;
    impl Sings for Choir {
        fn song(&self) -> &str {
            "la"
        }
    }

    fn orb() -> Entity {
        Entity::new("orb", "Glowing Orb")
    }

    #[test]
    fn authored_ids_are_stable() {
        assert_eq!(orb().id(), Entity::new("orb", "Another Name").id());
        assert_ne!(Entity::spawned("x").id(), Entity::spawned("x").id());
    }

    #[test]
    fn missing_prerequisite_is_rejected() {
        let mut entity = orb();
        let err = entity.add_behaviour::<dyn Hums>(Box::new(Drone("low"))).unwrap_err();
        assert_eq!(
            err,
            BehaviourError::MissingPrerequisite {
                entity: entity.to_string(),
                capability: "hums",
                requires: "shines",
            }
        );
        assert!(!entity.has_behaviours::<dyn Hums>());

        entity.add_behaviour::<dyn Shines>(Box::new(Bulb(40))).unwrap();
        entity.add_behaviour::<dyn Hums>(Box::new(Drone("low"))).unwrap();
        assert_eq!(entity.try_get_behaviour::<dyn Hums>().map(Hums::pitch), Some("low"));
    }

    #[test]
    fn capabilities_hold_multiple_instances() {
        let mut entity = orb();
        for lumens in [10, 20, 30] {
            entity.add_behaviour::<dyn Shines>(Box::new(Bulb(lumens))).unwrap();
        }
        let all = entity.get_all_behaviours::<dyn Shines>();
        assert_eq!(all.len(), 3);
        assert_eq!(all.iter().map(|b| b.lumens()).collect::<Vec<_>>(), vec![10, 20, 30]);
        assert_eq!(entity.try_get_behaviour::<dyn Shines>().map(Shines::lumens), Some(10));

        assert_eq!(entity.remove_behaviour::<dyn Shines>(), 3);
        assert!(entity.get_all_behaviours::<dyn Shines>().is_empty());
        assert!(entity.try_get_behaviour::<dyn Shines>().is_none());
        assert_eq!(entity.remove_behaviour::<dyn Shines>(), 0);
    }

    #[test]
    fn absent_capability_is_none_not_error() {
        let entity = orb();
        assert!(entity.try_get_behaviour::<dyn Sings>().is_none());
        assert!(!entity.has_behaviours::<dyn Sings>());
        assert!(entity.get_all_behaviours::<dyn Sings>().is_empty());
    }

    #[test]
    fn mutable_access_reaches_every_instance() {
        struct Dimmer(u32);
        impl Shines for Dimmer {
            fn lumens(&self) -> u32 {
                self.0
            }
        }
        let mut entity = orb();
        entity.add_behaviour::<dyn Shines>(Box::new(Dimmer(5))).unwrap();
        assert!(entity.try_get_behaviour_mut::<dyn Shines>().is_some());
        assert_eq!(entity.get_all_behaviours_mut::<dyn Shines>().len(), 1);
    }

    #[test]
    fn erased_attach_checks_instance_type() {
        let mut entity = orb();
        let wrong = erase::<dyn Sings>(Box::new(Choir));
        let err = entity
            .add_behaviour_erased(CapabilityId::of::<dyn Shines>(), wrong)
            .unwrap_err();
        assert!(matches!(err, BehaviourError::TypeMismatch { capability: "shines", .. }));

        let right = erase::<dyn Shines>(Box::new(Bulb(1)));
        entity
            .add_behaviour_erased(CapabilityId::of::<dyn Shines>(), right)
            .unwrap();
        assert!(entity.has_behaviours::<dyn Shines>());

        // prerequisites still apply on the erased path
        let mut bare = orb();
        let hum = erase::<dyn Hums>(Box::new(Drone("high")));
        assert!(matches!(
            bare.add_behaviour_erased(CapabilityId::of::<dyn Hums>(), hum),
            Err(BehaviourError::MissingPrerequisite { requires: "shines", .. })
        ));
    }

    #[test]
    fn capabilities_are_listed_by_name() {
        let mut entity = orb();
        entity.add_behaviour::<dyn Sings>(Box::new(Choir)).unwrap();
        entity.add_behaviour::<dyn Shines>(Box::new(Bulb(1))).unwrap();
        let names: Vec<_> = entity.capabilities().iter().map(CapabilityId::name).collect();
        assert_eq!(names, vec!["shines", "sings"]);
    }
}

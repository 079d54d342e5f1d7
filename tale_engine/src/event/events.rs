//! Events published by the core itself.
//!
//! Content is free to define its own event types; these are the ones stock behaviours,
//! the quest log and the session emit.

use super::Event;
use crate::entity::EntityId;
use crate::quest::QuestId;

/// An entity's `Usable` capability was invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemUsed {
    pub item: EntityId,
    pub actor: EntityId,
}
impl Event for ItemUsed {}

/// An entity was equipped by an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemEquipped {
    pub item: EntityId,
    pub actor: EntityId,
}
impl Event for ItemEquipped {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerOpened {
    pub container: EntityId,
    pub actor: EntityId,
}
impl Event for ContainerOpened {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerClosed {
    pub container: EntityId,
    pub actor: EntityId,
}
impl Event for ContainerClosed {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerUnlocked {
    pub container: EntityId,
    pub key: EntityId,
}
impl Event for ContainerUnlocked {}

/// Damage was dealt to an `Attackable` entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityAttacked {
    pub target: EntityId,
    pub attacker: EntityId,
    pub damage: u32,
    pub destroyed: bool,
}
impl Event for EntityAttacked {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestCompleted {
    pub quest: QuestId,
    pub name: String,
}
impl Event for QuestCompleted {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestFailed {
    pub quest: QuestId,
    pub name: String,
}
impl Event for QuestFailed {}

/// Broadcast once when a session begins its first turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStarted;
impl Event for SessionStarted {
    const ONE_TIME: bool = true;
}

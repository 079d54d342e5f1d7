//! Stock capability contracts and common behaviours.
//!
//! Each gameplay verb is a capability trait. Content composes objects from the stock
//! behaviours below (or its own implementations) rather than subclassing anything:
//! a locked chest is `Container` + `KeyedLock`, a lever that opens a gate is
//! `Consumable` + a `ReactsOnUse` that sets a flag.

use log::{info, warn};
use thiserror::Error;

use super::EntityId;
use crate::capability;
use crate::event::{
    ContainerClosed, ContainerOpened, ContainerUnlocked, EntityAttacked, Event, EventBus, ItemEquipped, ItemUsed,
};
use crate::state::GameState;

/// What a behaviour gets to touch while it acts.
pub struct ActionContext<'a> {
    /// Who is performing the action (usually the player entity).
    pub actor: EntityId,
    pub state: &'a mut GameState,
    pub bus: &'a EventBus,
}

impl<'a> ActionContext<'a> {
    pub fn new(actor: EntityId, state: &'a mut GameState, bus: &'a EventBus) -> Self {
        Self { actor, state, bus }
    }
}

/// A well-formed reason an action didn't happen. The front end turns these into text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Refusal {
    #[error("it's already open")]
    AlreadyOpen,
    #[error("it's already closed")]
    AlreadyClosed,
    #[error("it's locked")]
    Locked,
    #[error("it's already locked")]
    AlreadyLocked,
    #[error("it isn't locked")]
    NotLocked,
    #[error("it has to be closed first")]
    MustBeClosed,
    #[error("that key doesn't fit")]
    WrongKey,
    #[error("it's already equipped")]
    AlreadyEquipped,
    #[error("it isn't equipped")]
    NotEquipped,
    #[error("it's used up")]
    UsedUp,
    #[error("it's already destroyed")]
    Destroyed,
    #[error("{0}")]
    Other(String),
}

pub type ActionResult = Result<(), Refusal>;

/// Produces the main description of an entity.
pub trait Describable {
    fn describe(&self, state: &GameState) -> String;
}

/// Produces close-up detail text ("examine").
pub trait Inspectable {
    fn inspect(&self, state: &GameState) -> String;
}

pub trait Openable {
    fn is_open(&self) -> bool;
    fn open(&mut self, ctx: &mut ActionContext<'_>) -> ActionResult;
    fn close(&mut self, ctx: &mut ActionContext<'_>) -> ActionResult;
}

pub trait Lockable {
    fn is_locked(&self) -> bool;
    fn lock(&mut self, key: EntityId, ctx: &mut ActionContext<'_>) -> ActionResult;
    fn unlock(&mut self, key: EntityId, ctx: &mut ActionContext<'_>) -> ActionResult;
}

pub trait Usable {
    fn use_item(&mut self, ctx: &mut ActionContext<'_>) -> ActionResult;
}

/// A trigger fired after a successful use. Entities often carry several.
pub trait ReactsOnUse {
    fn on_use(&self, ctx: &mut ActionContext<'_>);
}

pub trait Equippable {
    fn slot(&self) -> &str;
    fn is_equipped(&self) -> bool;
    fn equip(&mut self, ctx: &mut ActionContext<'_>) -> ActionResult;
    fn unequip(&mut self, ctx: &mut ActionContext<'_>) -> ActionResult;
}

/// A trigger fired after a successful equip.
pub trait ReactsOnEquip {
    fn on_equip(&self, ctx: &mut ActionContext<'_>);
}

pub trait Attackable {
    fn integrity(&self) -> u32;
    fn take_hit(&mut self, damage: u32, ctx: &mut ActionContext<'_>) -> ActionResult;
}

capability!(dyn Describable, "describable");
capability!(dyn Inspectable, "inspectable");
capability!(dyn Openable, "openable");
capability!(dyn Lockable, "lockable", requires [dyn Openable]);
capability!(dyn Usable, "usable");
capability!(dyn ReactsOnUse, "reacts on use", requires [dyn Usable]);
capability!(dyn Equippable, "equippable");
capability!(dyn ReactsOnEquip, "reacts on equip", requires [dyn Equippable]);
capability!(dyn Attackable, "attackable");

/// Fixed description text.
#[derive(Debug, Clone)]
pub struct StaticText(pub String);

impl Describable for StaticText {
    fn describe(&self, _state: &GameState) -> String {
        self.0.clone()
    }
}

impl Inspectable for StaticText {
    fn inspect(&self, _state: &GameState) -> String {
        self.0.clone()
    }
}

/// Description that depends on a flag (e.g. a lamp that is lit or dark).
#[derive(Debug, Clone)]
pub struct FlagText {
    pub flag: String,
    pub when_set: String,
    pub when_unset: String,
}

impl Describable for FlagText {
    fn describe(&self, state: &GameState) -> String {
        if state.flags.is_set(&self.flag) {
            self.when_set.clone()
        } else {
            self.when_unset.clone()
        }
    }
}

/// Something that opens and closes.
#[derive(Debug, Clone)]
pub struct Container {
    owner: EntityId,
    open: bool,
}

impl Container {
    pub fn new(owner: EntityId, open: bool) -> Self {
        Self { owner, open }
    }
}

impl Openable for Container {
    fn is_open(&self) -> bool {
        self.open
    }

    fn open(&mut self, ctx: &mut ActionContext<'_>) -> ActionResult {
        if self.open {
            return Err(Refusal::AlreadyOpen);
        }
        self.open = true;
        info!("{} opened container {}", ctx.actor, self.owner);
        ctx.bus.publish(ContainerOpened {
            container: self.owner,
            actor: ctx.actor,
        });
        Ok(())
    }

    fn close(&mut self, ctx: &mut ActionContext<'_>) -> ActionResult {
        if !self.open {
            return Err(Refusal::AlreadyClosed);
        }
        self.open = false;
        ctx.bus.publish(ContainerClosed {
            container: self.owner,
            actor: ctx.actor,
        });
        Ok(())
    }
}

/// A lock that only one key entity fits.
#[derive(Debug, Clone)]
pub struct KeyedLock {
    owner: EntityId,
    key: EntityId,
    locked: bool,
}

impl KeyedLock {
    pub fn new(owner: EntityId, key: EntityId, locked: bool) -> Self {
        Self { owner, key, locked }
    }
}

impl Lockable for KeyedLock {
    fn is_locked(&self) -> bool {
        self.locked
    }

    fn lock(&mut self, key: EntityId, _ctx: &mut ActionContext<'_>) -> ActionResult {
        if self.locked {
            return Err(Refusal::AlreadyLocked);
        }
        if key != self.key {
            return Err(Refusal::WrongKey);
        }
        self.locked = true;
        Ok(())
    }

    fn unlock(&mut self, key: EntityId, ctx: &mut ActionContext<'_>) -> ActionResult {
        if !self.locked {
            return Err(Refusal::NotLocked);
        }
        if key != self.key {
            return Err(Refusal::WrongKey);
        }
        self.locked = false;
        info!("{} unlocked {} with {key}", ctx.actor, self.owner);
        ctx.bus.publish(ContainerUnlocked {
            container: self.owner,
            key,
        });
        Ok(())
    }
}

/// Usable a limited number of times (`None` = unlimited).
#[derive(Debug, Clone)]
pub struct Consumable {
    owner: EntityId,
    uses_left: Option<u32>,
}

impl Consumable {
    pub fn new(owner: EntityId, uses: Option<u32>) -> Self {
        Self {
            owner,
            uses_left: uses,
        }
    }

    pub fn unlimited(owner: EntityId) -> Self {
        Self::new(owner, None)
    }

    pub fn uses_left(&self) -> Option<u32> {
        self.uses_left
    }
}

impl Usable for Consumable {
    fn use_item(&mut self, ctx: &mut ActionContext<'_>) -> ActionResult {
        if let Some(uses) = self.uses_left.as_mut() {
            if *uses == 0 {
                return Err(Refusal::UsedUp);
            }
            *uses -= 1;
        }
        ctx.bus.publish(ItemUsed {
            item: self.owner,
            actor: ctx.actor,
        });
        Ok(())
    }
}

/// Sets a flag when its owner is used or equipped.
#[derive(Debug, Clone)]
pub struct SetFlag {
    pub flag: String,
    pub value: bool,
}

impl SetFlag {
    fn apply(&self, state: &mut GameState) {
        state.flags.set(&self.flag, self.value);
    }
}

impl ReactsOnUse for SetFlag {
    fn on_use(&self, ctx: &mut ActionContext<'_>) {
        self.apply(ctx.state);
    }
}

impl ReactsOnEquip for SetFlag {
    fn on_equip(&self, ctx: &mut ActionContext<'_>) {
        self.apply(ctx.state);
    }
}

/// Bumps an existing counter when its owner is used or equipped.
///
/// The counter must be registered; a missing counter is logged and left missing.
#[derive(Debug, Clone)]
pub struct BumpCounter {
    pub counter: String,
    pub amount: i32,
}

impl BumpCounter {
    fn apply(&self, state: &mut GameState) {
        if !state.counters.try_increment_by(&self.counter, self.amount) {
            warn!("counter '{}' is not registered; reaction skipped", self.counter);
        }
    }
}

impl ReactsOnUse for BumpCounter {
    fn on_use(&self, ctx: &mut ActionContext<'_>) {
        self.apply(ctx.state);
    }
}

impl ReactsOnEquip for BumpCounter {
    fn on_equip(&self, ctx: &mut ActionContext<'_>) {
        self.apply(ctx.state);
    }
}

/// Publishes a copy of a content-defined event when its owner is used or equipped.
#[derive(Debug, Clone)]
pub struct Announce<E>(pub E);

impl<E: Event + Clone> ReactsOnUse for Announce<E> {
    fn on_use(&self, ctx: &mut ActionContext<'_>) {
        ctx.bus.publish(self.0.clone());
    }
}

impl<E: Event + Clone> ReactsOnEquip for Announce<E> {
    fn on_equip(&self, ctx: &mut ActionContext<'_>) {
        ctx.bus.publish(self.0.clone());
    }
}

/// Something worn in a named slot.
#[derive(Debug, Clone)]
pub struct Wearable {
    owner: EntityId,
    slot: String,
    equipped: bool,
}

impl Wearable {
    pub fn new(owner: EntityId, slot: impl Into<String>) -> Self {
        Self {
            owner,
            slot: slot.into(),
            equipped: false,
        }
    }
}

impl Equippable for Wearable {
    fn slot(&self) -> &str {
        &self.slot
    }

    fn is_equipped(&self) -> bool {
        self.equipped
    }

    fn equip(&mut self, ctx: &mut ActionContext<'_>) -> ActionResult {
        if self.equipped {
            return Err(Refusal::AlreadyEquipped);
        }
        self.equipped = true;
        ctx.bus.publish(ItemEquipped {
            item: self.owner,
            actor: ctx.actor,
        });
        Ok(())
    }

    fn unequip(&mut self, _ctx: &mut ActionContext<'_>) -> ActionResult {
        if !self.equipped {
            return Err(Refusal::NotEquipped);
        }
        self.equipped = false;
        Ok(())
    }
}

/// Takes damage until its integrity reaches zero.
#[derive(Debug, Clone)]
pub struct Breakable {
    owner: EntityId,
    integrity: u32,
}

impl Breakable {
    pub fn new(owner: EntityId, integrity: u32) -> Self {
        Self { owner, integrity }
    }
}

impl Attackable for Breakable {
    fn integrity(&self) -> u32 {
        self.integrity
    }

    fn take_hit(&mut self, damage: u32, ctx: &mut ActionContext<'_>) -> ActionResult {
        if self.integrity == 0 {
            return Err(Refusal::Destroyed);
        }
        self.integrity = self.integrity.saturating_sub(damage);
        ctx.bus.publish(EntityAttacked {
            target: self.owner,
            attacker: ctx.actor,
            damage,
            destroyed: self.integrity == 0,
        });
        Ok(())
    }
}

//! Verb helpers.
//!
//! The command layer resolves "open chest" to an entity and calls one of these. Each
//! helper asks the entity whether it has the capability behind the verb, invokes it,
//! and fans out to any reaction capabilities. An entity lacking the capability yields
//! `VerbError::Unsupported`, which the front end words as "you can't open that".

use log::{debug, info};
use thiserror::Error;

use super::behaviours::{
    ActionContext, Attackable, Describable, Equippable, Inspectable, Lockable, Openable, ReactsOnEquip,
    ReactsOnUse, Refusal, Usable,
};
use super::{Entity, EntityId};
use crate::state::GameState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerbError {
    #[error("{entity} can't be {verb}")]
    Unsupported { verb: &'static str, entity: String },
    #[error(transparent)]
    Refused(#[from] Refusal),
}

pub type VerbResult = Result<(), VerbError>;

fn unsupported(verb: &'static str, entity: &Entity) -> VerbError {
    debug!("verb '{verb}' not supported by {entity}");
    VerbError::Unsupported {
        verb,
        entity: entity.name().to_string(),
    }
}

/// Open an entity. A locked entity refuses.
pub fn open(entity: &mut Entity, ctx: &mut ActionContext<'_>) -> VerbResult {
    if let Some(lock) = entity.try_get_behaviour::<dyn Lockable>()
        && lock.is_locked()
    {
        return Err(Refusal::Locked.into());
    }
    let Some(openable) = entity.try_get_behaviour_mut::<dyn Openable>() else {
        return Err(unsupported("opened", entity));
    };
    openable.open(ctx)?;
    info!("{} opened {entity}", ctx.actor);
    Ok(())
}

pub fn close(entity: &mut Entity, ctx: &mut ActionContext<'_>) -> VerbResult {
    let Some(openable) = entity.try_get_behaviour_mut::<dyn Openable>() else {
        return Err(unsupported("closed", entity));
    };
    openable.close(ctx)?;
    Ok(())
}

/// Lock an entity with `key`. It has to be closed first.
pub fn lock(entity: &mut Entity, key: EntityId, ctx: &mut ActionContext<'_>) -> VerbResult {
    if entity
        .try_get_behaviour::<dyn Openable>()
        .is_some_and(|o| o.is_open())
    {
        return Err(Refusal::MustBeClosed.into());
    }
    let Some(lockable) = entity.try_get_behaviour_mut::<dyn Lockable>() else {
        return Err(unsupported("locked", entity));
    };
    lockable.lock(key, ctx)?;
    Ok(())
}

pub fn unlock(entity: &mut Entity, key: EntityId, ctx: &mut ActionContext<'_>) -> VerbResult {
    let Some(lockable) = entity.try_get_behaviour_mut::<dyn Lockable>() else {
        return Err(unsupported("unlocked", entity));
    };
    lockable.unlock(key, ctx)?;
    info!("{} unlocked {entity}", ctx.actor);
    Ok(())
}

/// Use an entity, then run every `ReactsOnUse` attached to it in attach order.
pub fn use_entity(entity: &mut Entity, ctx: &mut ActionContext<'_>) -> VerbResult {
    let Some(usable) = entity.try_get_behaviour_mut::<dyn Usable>() else {
        return Err(unsupported("used", entity));
    };
    usable.use_item(ctx)?;
    let reactions = entity.get_all_behaviours::<dyn ReactsOnUse>();
    debug!("{entity} used; {} reaction(s)", reactions.len());
    for reaction in reactions {
        reaction.on_use(ctx);
    }
    Ok(())
}

/// Equip an entity, then run every `ReactsOnEquip` attached to it.
pub fn equip(entity: &mut Entity, ctx: &mut ActionContext<'_>) -> VerbResult {
    let Some(equippable) = entity.try_get_behaviour_mut::<dyn Equippable>() else {
        return Err(unsupported("equipped", entity));
    };
    equippable.equip(ctx)?;
    for reaction in entity.get_all_behaviours::<dyn ReactsOnEquip>() {
        reaction.on_equip(ctx);
    }
    Ok(())
}

pub fn unequip(entity: &mut Entity, ctx: &mut ActionContext<'_>) -> VerbResult {
    let Some(equippable) = entity.try_get_behaviour_mut::<dyn Equippable>() else {
        return Err(unsupported("unequipped", entity));
    };
    equippable.unequip(ctx)?;
    Ok(())
}

pub fn attack(entity: &mut Entity, damage: u32, ctx: &mut ActionContext<'_>) -> VerbResult {
    let Some(target) = entity.try_get_behaviour_mut::<dyn Attackable>() else {
        return Err(unsupported("attacked", entity));
    };
    target.take_hit(damage, ctx)?;
    Ok(())
}

/// The entity's description, or `None` if it has nothing to say.
pub fn describe(entity: &Entity, state: &GameState) -> Option<String> {
    entity
        .try_get_behaviour::<dyn Describable>()
        .map(|d| d.describe(state))
}

/// Close-up detail; falls back to the main description.
pub fn inspect(entity: &Entity, state: &GameState) -> Option<String> {
    entity
        .try_get_behaviour::<dyn Inspectable>()
        .map(|i| i.inspect(state))
        .or_else(|| describe(entity, state))
}

//! Subscription tokens.
//!
//! A [`SubscriptionToken`] is the only way to end a subscription. Dropping a token does
//! *not* unsubscribe; content that subscribes for the whole session can simply let the
//! token go. [`CompositeToken`] groups tokens owned by one system (e.g. every trigger an
//! NPC registered) so they can be retired together.

use std::any::{TypeId, type_name};
use std::sync::Weak;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use parking_lot::Mutex;

use super::{Event, Registry, SubscriptionId};

/// Something whose registration can be torn down exactly once.
pub trait Disposable: Send + Sync {
    /// Tear down. Calling this more than once has no further effect.
    fn dispose(&self);

    fn is_disposed(&self) -> bool;
}

/// Handle for exactly one subscription on an [`EventBus`](super::EventBus).
pub struct SubscriptionToken {
    id: SubscriptionId,
    event_type: TypeId,
    event_name: &'static str,
    registry: Weak<Registry>,
    disposed: AtomicBool,
}

impl SubscriptionToken {
    pub(crate) fn new<E: Event>(id: SubscriptionId, registry: Weak<Registry>) -> SubscriptionToken {
        SubscriptionToken {
            id,
            event_type: TypeId::of::<E>(),
            event_name: type_name::<E>(),
            registry,
            disposed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Name of the event type this token subscribes to.
    pub fn event_name(&self) -> &'static str {
        self.event_name
    }

    /// Remove the subscription from its bus. Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        // the bus may already be gone, or the subscription retired by a one-time publish
        if let Some(registry) = self.registry.upgrade()
            && registry.remove(self.event_type, self.id)
        {
            debug!("{} unsubscribed from {}", self.id, self.event_name);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl Disposable for SubscriptionToken {
    fn dispose(&self) {
        SubscriptionToken::dispose(self);
    }

    fn is_disposed(&self) -> bool {
        SubscriptionToken::is_disposed(self)
    }
}

impl std::fmt::Debug for SubscriptionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionToken")
            .field("id", &self.id)
            .field("event", &self.event_name)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[derive(Default)]
struct CompositeState {
    disposed: bool,
    members: Vec<Box<dyn Disposable>>,
}

/// An owning group of tokens disposed as a unit.
///
/// Once the group is disposed, any token added to it is disposed on the spot.
#[derive(Default)]
pub struct CompositeToken {
    state: Mutex<CompositeState>,
}

impl CompositeToken {
    pub fn new() -> CompositeToken {
        CompositeToken::default()
    }

    /// Take ownership of `token`. Disposes it immediately if this group is already disposed.
    pub fn add(&self, token: impl Disposable + 'static) {
        let mut state = self.state.lock();
        if state.disposed {
            drop(state);
            token.dispose();
            return;
        }
        state.members.push(Box::new(token));
    }

    pub fn len(&self) -> usize {
        self.state.lock().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dispose every member. Idempotent.
    pub fn dispose(&self) {
        let members = {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            std::mem::take(&mut state.members)
        };
        debug!("composite token disposing {} member(s)", members.len());
        for member in members {
            member.dispose();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }
}

impl Disposable for CompositeToken {
    fn dispose(&self) {
        CompositeToken::dispose(self);
    }

    fn is_disposed(&self) -> bool {
        CompositeToken::is_disposed(self)
    }
}

impl std::fmt::Debug for CompositeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CompositeToken")
            .field("members", &state.members.len())
            .field("disposed", &state.disposed)
            .finish()
    }
}

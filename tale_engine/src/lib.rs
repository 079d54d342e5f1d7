#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub const TALE_VERSION: &str = env!("CARGO_PKG_VERSION");

// Core modules
pub mod data_paths;
pub mod entity;
pub mod event;
pub mod idgen;
pub mod loader;
pub mod quest;
pub mod session;
pub mod state;

// Re-exports for convenience
pub use entity::{BehaviourError, Capability, CapabilityId, Entity, EntityId};
pub use event::{CompositeToken, Disposable, Event, EventBus, PublishReport, SubscriptionToken};
pub use loader::load_session;
pub use quest::{CriteriaBuilder, Quest, QuestFactory, QuestLog, QuestStatus};
pub use session::Session;
pub use state::GameState;
pub use tale_data::{CounterKey, FlagKey, KeyManifest, LabelKey, VariableKey};

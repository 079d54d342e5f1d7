//! The player's quest log: every registered quest, ticked together, with
//! resolutions announced on the event bus.

use std::collections::BTreeMap;
use std::time::Duration;

use log::{debug, info};

use super::{Quest, QuestError, QuestId, QuestStatus};
use crate::event::{EventBus, QuestCompleted, QuestFailed};
use crate::state::GameState;

/// A quest that resolved during a [`QuestLog::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestTransition {
    pub quest: QuestId,
    pub name: String,
    pub status: QuestStatus,
}

#[derive(Debug, Default)]
pub struct QuestLog {
    quests: BTreeMap<QuestId, Quest>,
}

impl QuestLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a quest.
    ///
    /// # Errors
    /// Rejects a second quest with the same id.
    pub fn add(&mut self, quest: Quest) -> Result<(), QuestError> {
        if self.quests.contains_key(quest.id()) {
            return Err(QuestError::DuplicateQuest {
                quest: quest.id().clone(),
            });
        }
        debug!("quest '{}' added to log", quest.id());
        self.quests.insert(quest.id().clone(), quest);
        Ok(())
    }

    pub fn get(&self, id: &QuestId) -> Option<&Quest> {
        self.quests.get(id)
    }

    pub fn get_mut(&mut self, id: &QuestId) -> Option<&mut Quest> {
        self.quests.get_mut(id)
    }

    pub fn remove(&mut self, id: &QuestId) -> Option<Quest> {
        self.quests.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quest> {
        self.quests.values()
    }

    pub fn in_progress(&self) -> impl Iterator<Item = &Quest> {
        self.iter().filter(|q| q.status().is_in_progress())
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }

    pub fn clear(&mut self) {
        self.quests.clear();
    }

    /// Tick every unresolved quest and publish `QuestCompleted` / `QuestFailed`
    /// for each one that resolves.
    pub fn tick(&mut self, delta: Duration, state: &GameState, bus: &EventBus) -> Vec<QuestTransition> {
        let mut transitions = Vec::new();
        for quest in self.quests.values_mut().filter(|q| q.status().is_in_progress()) {
            let status = quest.tick(delta, state);
            if status.is_terminal() {
                transitions.push(QuestTransition {
                    quest: quest.id().clone(),
                    name: quest.name().to_string(),
                    status,
                });
            }
        }

        for t in &transitions {
            info!("quest log: '{}' -> {:?}", t.quest, t.status);
            match t.status {
                QuestStatus::Completed => {
                    bus.publish(QuestCompleted {
                        quest: t.quest.clone(),
                        name: t.name.clone(),
                    });
                },
                QuestStatus::Failed => {
                    bus.publish(QuestFailed {
                        quest: t.quest.clone(),
                        name: t.name.clone(),
                    });
                },
                QuestStatus::InProgress => {},
            }
        }
        transitions
    }
}

//! Quests --
//!
//! A quest owns one set of completion criteria and an optional set of failure
//! criteria, and is driven by [`Quest::tick`] once per turn or time slice. The first
//! tick on which any failure criterion holds fails the quest; otherwise the first tick
//! on which every completion criterion holds completes it. Failure is checked first,
//! so a quest that could go either way on the same tick fails. Once resolved a quest
//! never evaluates anything again.

pub mod criteria;
pub mod factory;
pub mod journal;
pub mod tracker;

pub use criteria::{Condition, CriteriaBuilder, CriteriaError, CriteriaRole, QuestCriteria};
pub use factory::{QuestError, QuestFactory};
pub use journal::{QuestLog, QuestTransition};
pub use tracker::ElapsedTracker;

use std::fmt;
use std::time::Duration;

use log::{info, trace};
use serde::{Deserialize, Serialize};
use variantly::Variantly;

use crate::state::GameState;

/// Authored, stable quest identifier (e.g. `"find_the_lantern"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestId(String);

impl QuestId {
    pub fn new(id: impl Into<String>) -> QuestId {
        QuestId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuestId {
    fn from(value: &str) -> Self {
        QuestId::new(value)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Variantly)]
pub enum QuestStatus {
    #[default]
    InProgress,
    Completed,
    Failed,
}

impl QuestStatus {
    pub fn is_terminal(self) -> bool {
        !self.is_in_progress()
    }
}

/// Display metadata handed to quest callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestInfo {
    pub id: QuestId,
    pub name: String,
    pub description: String,
}

impl QuestInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> QuestInfo {
        QuestInfo {
            id: QuestId::new(id),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Invoked once when a quest resolves.
pub type QuestCallback = Box<dyn FnMut(&QuestInfo) + Send>;

/// A tick-driven quest. Built by [`QuestFactory::build`].
pub struct Quest {
    info: QuestInfo,
    status: QuestStatus,
    completion: Vec<QuestCriteria>,
    failure: Vec<QuestCriteria>,
    on_complete: QuestCallback,
    on_fail: Option<QuestCallback>,
}

impl Quest {
    pub fn id(&self) -> &QuestId {
        &self.info.id
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn description(&self) -> &str {
        &self.info.description
    }

    pub fn info(&self) -> &QuestInfo {
        &self.info
    }

    pub fn status(&self) -> QuestStatus {
        self.status
    }

    /// Advance every criterion by `delta` and resolve the quest if it can be.
    ///
    /// Returns the status after this tick. A resolved quest returns its status
    /// without touching any criteria.
    pub fn tick(&mut self, delta: Duration, state: &GameState) -> QuestStatus {
        if self.status.is_terminal() {
            return self.status;
        }

        // every criterion sees every tick so the per-criteria clocks stay in step
        let failed = self
            .failure
            .iter_mut()
            .map(|c| c.evaluate(state, delta))
            .fold(false, |acc, hit| acc | hit);
        if failed {
            self.status = QuestStatus::Failed;
            info!("quest '{}' ({}) failed", self.info.name, self.info.id);
            if let Some(on_fail) = self.on_fail.as_mut() {
                on_fail(&self.info);
            }
            return self.status;
        }

        let complete = self
            .completion
            .iter_mut()
            .map(|c| c.evaluate(state, delta))
            .fold(true, |acc, hit| acc & hit);
        if complete {
            self.status = QuestStatus::Completed;
            info!("quest '{}' ({}) completed", self.info.name, self.info.id);
            (self.on_complete)(&self.info);
        } else {
            trace!("quest '{}' still in progress", self.info.id);
        }
        self.status
    }

    /// Restart every criterion's clock, e.g. when the player re-enters an area.
    pub fn reset_timers(&mut self) {
        self.completion
            .iter_mut()
            .chain(self.failure.iter_mut())
            .for_each(QuestCriteria::reset_timer);
    }
}

impl fmt::Debug for Quest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Quest")
            .field("info", &self.info)
            .field("status", &self.status)
            .field("completion", &self.completion.len())
            .field("failure", &self.failure.len())
            .finish_non_exhaustive()
    }
}

use log::{error, info};
use thiserror::Error;

use super::criteria::{CriteriaRole, QuestCriteria};
use super::{Quest, QuestCallback, QuestId, QuestInfo, QuestStatus};

/// Invalid quest assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestError {
    #[error("quest '{quest}' has no completion criteria")]
    NoCompletionCriteria { quest: QuestId },
    #[error("quest '{quest}': {role} criteria #{index} was placed in the {slot} set")]
    WrongRole {
        quest: QuestId,
        index: usize,
        role: CriteriaRole,
        slot: CriteriaRole,
    },
    #[error("quest '{quest}': {slot} criteria #{index} has neither a state nor a time predicate")]
    EmptyCriteria {
        quest: QuestId,
        index: usize,
        slot: CriteriaRole,
    },
    #[error("quest '{quest}': failure criteria #{index} needs a time limit")]
    MissingTimeLimit { quest: QuestId, index: usize },
    #[error("a quest with id '{quest}' is already registered")]
    DuplicateQuest { quest: QuestId },
}

/// Assembles sealed criteria into a [`Quest`], rejecting anything malformed.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestFactory {
    require_time_limit: bool,
}

impl QuestFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every failure criterion must carry a time predicate (timed quests).
    #[must_use]
    pub fn require_time_limit(mut self, required: bool) -> Self {
        self.require_time_limit = required;
        self
    }

    /// Build a quest. `completion` must be non-empty; `failure` may be empty.
    ///
    /// # Errors
    /// Returns a [`QuestError`] describing the first problem found.
    pub fn build(
        &self,
        info: QuestInfo,
        completion: Vec<QuestCriteria>,
        failure: Vec<QuestCriteria>,
        on_complete: QuestCallback,
        on_fail: Option<QuestCallback>,
    ) -> Result<Quest, QuestError> {
        if let Err(e) = self.check(&info.id, &completion, &failure) {
            error!("rejected quest '{}': {e}", info.id);
            return Err(e);
        }
        info!(
            "built quest '{}' ({} completion, {} failure criteria)",
            info.id,
            completion.len(),
            failure.len()
        );
        Ok(Quest {
            info,
            status: QuestStatus::InProgress,
            completion,
            failure,
            on_complete,
            on_fail,
        })
    }

    fn check(
        &self,
        quest: &QuestId,
        completion: &[QuestCriteria],
        failure: &[QuestCriteria],
    ) -> Result<(), QuestError> {
        if completion.is_empty() {
            return Err(QuestError::NoCompletionCriteria { quest: quest.clone() });
        }
        for (slot, set) in [(CriteriaRole::Completion, completion), (CriteriaRole::Failure, failure)] {
            for (index, criteria) in set.iter().enumerate() {
                if criteria.role() != slot {
                    return Err(QuestError::WrongRole {
                        quest: quest.clone(),
                        index,
                        role: criteria.role(),
                        slot,
                    });
                }
                if !criteria.has_state_predicate() && criteria.time_limit().is_none() {
                    return Err(QuestError::EmptyCriteria {
                        quest: quest.clone(),
                        index,
                        slot,
                    });
                }
                if self.require_time_limit && slot == CriteriaRole::Failure && criteria.time_limit().is_none() {
                    return Err(QuestError::MissingTimeLimit {
                        quest: quest.clone(),
                        index,
                    });
                }
            }
        }
        Ok(())
    }
}

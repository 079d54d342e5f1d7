//! Quest criteria: a staged builder that seals into an immutable predicate.
//!
//! ```
//! use std::time::Duration;
//! use tale_engine::quest::CriteriaBuilder;
//!
//! let criteria = CriteriaBuilder::new()
//!     .when(|s| s.flags.is_set("bridge_lowered"))?
//!     .and_if_time_has_passed(Duration::from_secs(30))?
//!     .then_progress_this_quest()?;
//! assert!(criteria.has_state_predicate());
//! # Ok::<(), tale_engine::quest::CriteriaError>(())
//! ```

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use super::tracker::ElapsedTracker;
use crate::state::GameState;

type Predicate = Box<dyn Fn(&GameState) -> bool + Send + Sync>;

/// Which side of a quest a sealed criteria object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriteriaRole {
    Completion,
    Failure,
}

impl fmt::Display for CriteriaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CriteriaRole::Completion => f.write_str("completion"),
            CriteriaRole::Failure => f.write_str("failure"),
        }
    }
}

/// Builder misuse. Always a wiring defect in content code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CriteriaError {
    #[error("criteria chain must be opened with `when`, `when_not` or `if_time_has_passed` first")]
    NotOpened,
    #[error("criteria chain is already open")]
    AlreadyOpened,
    #[error("cannot OR onto a chain that has no state predicate")]
    NoStatePredicate,
}

/// A composed predicate over game state. Also used as a nested chain in
/// [`CriteriaBuilder::and_if_all`] / [`CriteriaBuilder::or_if_all`].
pub struct Condition {
    predicate: Predicate,
}

impl Condition {
    pub fn when<F>(predicate: F) -> Condition
    where
        F: Fn(&GameState) -> bool + Send + Sync + 'static,
    {
        Condition {
            predicate: Box::new(predicate),
        }
    }

    pub fn when_not<F>(predicate: F) -> Condition
    where
        F: Fn(&GameState) -> bool + Send + Sync + 'static,
    {
        Condition::when(move |s| !predicate(s))
    }

    #[must_use]
    pub fn and<F>(self, predicate: F) -> Condition
    where
        F: Fn(&GameState) -> bool + Send + Sync + 'static,
    {
        self.and_all(Condition::when(predicate))
    }

    #[must_use]
    pub fn or<F>(self, predicate: F) -> Condition
    where
        F: Fn(&GameState) -> bool + Send + Sync + 'static,
    {
        self.or_all(Condition::when(predicate))
    }

    #[must_use]
    pub fn and_all(self, other: Condition) -> Condition {
        let (lhs, rhs) = (self.predicate, other.predicate);
        Condition::when(move |s| lhs(s) && rhs(s))
    }

    #[must_use]
    pub fn or_all(self, other: Condition) -> Condition {
        let (lhs, rhs) = (self.predicate, other.predicate);
        Condition::when(move |s| lhs(s) || rhs(s))
    }

    #[must_use]
    pub fn negate(self) -> Condition {
        let inner = self.predicate;
        Condition::when(move |s| !inner(s))
    }

    pub fn holds(&self, state: &GameState) -> bool {
        (self.predicate)(state)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Condition(..)")
    }
}

#[derive(Debug, Default)]
enum Stage {
    #[default]
    Unstarted,
    Started {
        condition: Option<Condition>,
        after: Option<Duration>,
    },
}

/// Incrementally builds one criteria object.
///
/// Every step consumes the builder and returns it back on success, so misuse
/// surfaces at the `?` where it happened.
#[derive(Debug, Default)]
pub struct CriteriaBuilder {
    stage: Stage,
}

impl CriteriaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn when<F>(self, predicate: F) -> Result<Self, CriteriaError>
    where
        F: Fn(&GameState) -> bool + Send + Sync + 'static,
    {
        self.open(Condition::when(predicate))
    }

    pub fn when_not<F>(self, predicate: F) -> Result<Self, CriteriaError>
    where
        F: Fn(&GameState) -> bool + Send + Sync + 'static,
    {
        self.open(Condition::when_not(predicate))
    }

    pub fn and_if<F>(self, predicate: F) -> Result<Self, CriteriaError>
    where
        F: Fn(&GameState) -> bool + Send + Sync + 'static,
    {
        self.and_if_all(Condition::when(predicate))
    }

    /// AND a nested chain. On a time-only chain this becomes the state predicate.
    pub fn and_if_all(self, nested: Condition) -> Result<Self, CriteriaError> {
        let Stage::Started { condition, after } = self.stage else {
            return Err(CriteriaError::NotOpened);
        };
        let condition = Some(match condition {
            Some(existing) => existing.and_all(nested),
            None => nested,
        });
        Ok(Self {
            stage: Stage::Started { condition, after },
        })
    }

    pub fn or_if<F>(self, predicate: F) -> Result<Self, CriteriaError>
    where
        F: Fn(&GameState) -> bool + Send + Sync + 'static,
    {
        self.or_if_all(Condition::when(predicate))
    }

    pub fn or_if_all(self, nested: Condition) -> Result<Self, CriteriaError> {
        match self.stage {
            Stage::Unstarted => Err(CriteriaError::NotOpened),
            Stage::Started { condition: None, .. } => Err(CriteriaError::NoStatePredicate),
            Stage::Started {
                condition: Some(existing),
                after,
            } => Ok(Self {
                stage: Stage::Started {
                    condition: Some(existing.or_all(nested)),
                    after,
                },
            }),
        }
    }

    /// Require `limit` of ticked time. Opens the chain if it is not open yet.
    pub fn if_time_has_passed(self, limit: Duration) -> Result<Self, CriteriaError> {
        match self.stage {
            Stage::Unstarted => Ok(Self {
                stage: Stage::Started {
                    condition: None,
                    after: Some(limit),
                },
            }),
            started @ Stage::Started { .. } => Self { stage: started }.and_if_time_has_passed(limit),
        }
    }

    /// AND a time requirement onto an open chain. Two limits collapse to the longer one.
    pub fn and_if_time_has_passed(self, limit: Duration) -> Result<Self, CriteriaError> {
        let Stage::Started { condition, after } = self.stage else {
            return Err(CriteriaError::NotOpened);
        };
        let after = Some(after.map_or(limit, |existing| existing.max(limit)));
        Ok(Self {
            stage: Stage::Started { condition, after },
        })
    }

    pub fn then_progress_this_quest(self) -> Result<QuestCriteria, CriteriaError> {
        self.seal(CriteriaRole::Completion)
    }

    pub fn then_fail_this_quest(self) -> Result<QuestCriteria, CriteriaError> {
        self.seal(CriteriaRole::Failure)
    }

    fn open(self, condition: Condition) -> Result<Self, CriteriaError> {
        match self.stage {
            Stage::Unstarted => Ok(Self {
                stage: Stage::Started {
                    condition: Some(condition),
                    after: None,
                },
            }),
            Stage::Started { .. } => Err(CriteriaError::AlreadyOpened),
        }
    }

    fn seal(self, role: CriteriaRole) -> Result<QuestCriteria, CriteriaError> {
        let Stage::Started { condition, after } = self.stage else {
            return Err(CriteriaError::NotOpened);
        };
        Ok(QuestCriteria {
            role,
            condition,
            after,
            tracker: ElapsedTracker::new(),
        })
    }
}

/// A sealed criteria object. Role and predicate can no longer change; only the
/// private elapsed-time accumulator moves.
#[derive(Debug)]
pub struct QuestCriteria {
    role: CriteriaRole,
    condition: Option<Condition>,
    after: Option<Duration>,
    tracker: ElapsedTracker,
}

impl QuestCriteria {
    pub fn role(&self) -> CriteriaRole {
        self.role
    }

    pub fn has_state_predicate(&self) -> bool {
        self.condition.is_some()
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.after
    }

    pub fn elapsed(&self) -> Duration {
        self.tracker.elapsed()
    }

    /// Advance this criteria's clock by `delta`, then test it.
    pub fn evaluate(&mut self, state: &GameState, delta: Duration) -> bool {
        self.tracker.advance(delta);
        let state_ok = self.condition.as_ref().is_none_or(|c| c.holds(state));
        let time_ok = self.after.is_none_or(|limit| self.tracker.has_passed(limit));
        state_ok && time_ok
    }

    pub fn reset_timer(&mut self) {
        self.tracker.reset();
    }
}

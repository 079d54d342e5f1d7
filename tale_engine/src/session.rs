//! A play session: the state store, the bus and the quest log, advanced one turn at a time.

use std::time::Duration;

use anyhow::Result;
use log::{debug, info};

use crate::data_paths::data_root;
use crate::event::{EventBus, SessionStarted};
use crate::loader::load_session;
use crate::quest::{QuestLog, QuestTransition};
use crate::state::GameState;

/// Everything one game in progress owns.
///
/// The command layer mutates `state` and publishes on `bus` while resolving a player
/// action, then calls [`Session::advance`] to close out the turn.
#[derive(Debug)]
pub struct Session {
    pub state: GameState,
    pub bus: EventBus,
    pub quests: QuestLog,
    turn: u64,
    elapsed: Duration,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// An empty session with its own private bus.
    pub fn new() -> Session {
        Session::with_parts(GameState::new(), QuestLog::new())
    }

    pub fn with_parts(state: GameState, quests: QuestLog) -> Session {
        Session {
            state,
            bus: EventBus::new(),
            quests,
            turn: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Load the session described by the content files in the data directory.
    ///
    /// # Errors
    /// See [`load_session`].
    pub fn load() -> Result<Session> {
        load_session(data_root())
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Finish a turn that took `delta` of game time.
    ///
    /// The first call announces `SessionStarted`. Returns the quests that resolved.
    pub fn advance(&mut self, delta: Duration) -> Vec<QuestTransition> {
        if self.turn == 0 {
            info!("session started");
            self.bus.publish(SessionStarted);
        }
        self.turn += 1;
        self.elapsed = self.elapsed.saturating_add(delta);
        let transitions = self.quests.tick(delta, &self.state, &self.bus);
        debug!(
            "turn {} done ({:.1}s elapsed, {} quest(s) resolved)",
            self.turn,
            self.elapsed.as_secs_f64(),
            transitions.len()
        );
        transitions
    }

    /// Wipe state, subscriptions and quests, and rewind the clock. For test isolation.
    pub fn reset(&mut self) {
        self.state.clear_all();
        self.bus.clear();
        self.quests.clear();
        self.turn = 0;
        self.elapsed = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::{CriteriaBuilder, QuestFactory, QuestInfo, QuestStatus};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn first_advance_announces_start_once() {
        let mut session = Session::new();
        let starts = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&starts);
        let _t = session.bus.subscribe(move |_: &SessionStarted| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        session.advance(Duration::from_secs(1));
        session.advance(Duration::from_secs(2));
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(session.turn(), 2);
        assert_eq!(session.elapsed(), Duration::from_secs(3));
        assert!(!session.bus.has_subscribers::<SessionStarted>());
    }

    #[test]
    fn advance_ticks_quests_and_reset_clears_everything() {
        let mut session = Session::new();
        let criteria = CriteriaBuilder::new()
            .when(|s| s.flags.is_set("done"))
            .unwrap()
            .then_progress_this_quest()
            .unwrap();
        let quest = QuestFactory::new()
            .build(
                QuestInfo::new("q", "Q", ""),
                vec![criteria],
                Vec::new(),
                Box::new(|_: &QuestInfo| {}),
                None,
            )
            .unwrap();
        session.quests.add(quest).unwrap();

        session.state.flags.set("done", true);
        let transitions = session.advance(Duration::from_secs(1));
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].status, QuestStatus::Completed);

        session.reset();
        assert_eq!(session.turn(), 0);
        assert!(session.quests.is_empty());
        assert!(session.state.flags.is_empty());
    }
}

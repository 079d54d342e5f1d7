use std::time::Duration;

/// Accumulates ticked game time for one criteria object.
///
/// Time only moves when the owner ticks it; there is no wall clock involved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElapsedTracker {
    elapsed: Duration,
}

impl ElapsedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, delta: Duration) {
        self.elapsed = self.elapsed.saturating_add(delta);
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn has_passed(&self, limit: Duration) -> bool {
        self.elapsed >= limit
    }

    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_and_resets() {
        let mut tracker = ElapsedTracker::new();
        tracker.advance(Duration::from_secs(2));
        tracker.advance(Duration::from_millis(500));
        assert_eq!(tracker.elapsed(), Duration::from_millis(2500));
        assert!(tracker.has_passed(Duration::from_secs(2)));
        assert!(!tracker.has_passed(Duration::from_secs(3)));
        tracker.reset();
        assert_eq!(tracker.elapsed(), Duration::ZERO);
    }

    #[test]
    fn saturates_instead_of_overflowing() {
        let mut tracker = ElapsedTracker::new();
        tracker.advance(Duration::MAX);
        tracker.advance(Duration::from_secs(1));
        assert_eq!(tracker.elapsed(), Duration::MAX);
    }
}

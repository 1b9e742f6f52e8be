//! Restartable quiet-period timer.
//!
//! Classic debounce, not throttle: every qualifying trigger moves the
//! deadline out by the full delay, so only the final edit of a burst ever
//! fires. The timer holds no clock of its own; the host runtime passes
//! `Instant`s in, which keeps the behavior scriptable in tests.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct DebounceTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    /// Start or restart the quiet period.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Cancel any pending deadline.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Whether a deadline is armed.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the deadline if it has elapsed. Fires at most once per
    /// trigger.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(400);

    #[test]
    fn fires_only_after_the_quiet_period() {
        let start = Instant::now();
        let mut timer = DebounceTimer::new(DELAY);
        timer.trigger(start);

        assert!(!timer.fire_if_due(start + Duration::from_millis(399)));
        assert!(timer.fire_if_due(start + DELAY));
        // Consumed: does not fire again.
        assert!(!timer.fire_if_due(start + Duration::from_secs(5)));
    }

    #[test]
    fn retrigger_pushes_the_deadline_out() {
        let start = Instant::now();
        let mut timer = DebounceTimer::new(DELAY);
        timer.trigger(start);
        timer.trigger(start + Duration::from_millis(300));

        // The original deadline has passed but the restart superseded it.
        assert!(!timer.fire_if_due(start + DELAY));
        assert!(timer.fire_if_due(start + Duration::from_millis(700)));
    }

    #[test]
    fn cancel_clears_the_deadline() {
        let start = Instant::now();
        let mut timer = DebounceTimer::new(DELAY);
        timer.trigger(start);
        timer.cancel();
        assert!(!timer.is_pending());
        assert!(!timer.fire_if_due(start + Duration::from_secs(1)));
    }
}

//! Debounced save scheduling.
//!
//! The timer owns no thread and reads no clock: callers pass `Instant`s in,
//! which keeps it deterministic under test. Scheduling again replaces the
//! pending deadline, so a burst of edits produces one save after the last.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct DebounceTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn new(delay: Duration) -> Self {
        DebounceTimer { delay, deadline: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm (or re-arm) the timer to fire `delay` after `now`.
    ///
    /// Returns true if this replaced a deadline that hadn't fired yet.
    pub fn schedule(&mut self, now: Instant) -> bool {
        let replaced = self.deadline.is_some();
        self.deadline = Some(now + self.delay);
        tracing::debug!(delay_ms = self.delay.as_millis() as u64, replaced, "save scheduled");
        replaced
    }

    /// Disarm without firing. Returns true if something was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Consume the deadline if it has passed. Returns true when it fired.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }

    /// Fire immediately (explicit save or blur). Returns true if something
    /// was pending.
    pub fn force(&mut self) -> bool {
        self.cancel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_after_delay() {
        let start = Instant::now();
        let mut timer = DebounceTimer::new(Duration::from_millis(500));
        timer.schedule(start);

        assert!(!timer.fire_if_due(start + Duration::from_millis(499)));
        assert!(timer.fire_if_due(start + Duration::from_millis(500)));
        assert!(!timer.is_pending());
        assert!(!timer.fire_if_due(start + Duration::from_secs(5)));
    }

    #[test]
    fn test_reschedule_replaces_deadline() {
        let start = Instant::now();
        let mut timer = DebounceTimer::new(Duration::from_millis(500));
        assert!(!timer.schedule(start));
        assert!(timer.schedule(start + Duration::from_millis(300)));

        // The first deadline no longer fires
        assert!(!timer.is_due(start + Duration::from_millis(600)));
        assert!(timer.is_due(start + Duration::from_millis(800)));
    }

    #[test]
    fn test_cancel_and_force() {
        let start = Instant::now();
        let mut timer = DebounceTimer::new(Duration::from_millis(500));
        assert!(!timer.cancel());

        timer.schedule(start);
        assert!(timer.cancel());
        assert!(!timer.is_due(start + Duration::from_secs(1)));

        timer.schedule(start);
        assert!(timer.force());
        assert!(!timer.force());
    }
}

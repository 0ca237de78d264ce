//! Single-shot deactivation timer.
//!
//! The timer is a deadline, not a thread: the controller loop races it
//! against the event queue and calls [`DebounceTimer::take_expired`] when
//! it wakes.  Holding one `Option<Instant>` makes "at most one pending
//! deactivation" structural: arming overwrites the previous deadline.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceTimer {
    deadline: Option<Instant>,
    /// Number of times the timer has been armed (diagnostics).
    armed_count: u64,
}

impl DebounceTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm for `delay` from `now`, replacing any pending deadline.
    /// Returns `true` if a previous deadline was superseded.
    ///
    /// A delay too long to be represented as an `Instant` never fires: the
    /// previous deadline is dropped and nothing new is pending.
    pub fn arm(&mut self, now: Instant, delay: Duration) -> bool {
        self.armed_count += 1;
        let previous = self.deadline.take();
        self.deadline = now.checked_add(delay);
        previous.is_some()
    }

    /// Cancel the pending deadline.  Idempotent.
    /// Returns `true` if a deadline was actually pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn armed_count(&self) -> u64 {
        self.armed_count
    }

    /// Consume the deadline if `now` has reached it.
    ///
    /// Returns `true` at most once per arm cycle, and never before the
    /// deadline.
    pub fn take_expired(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(at) if now >= at => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

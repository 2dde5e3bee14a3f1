//! Fire-once timer queue.

use std::{collections::BTreeMap, time::Instant};

use crate::Timer;

/// Pending timers keyed by kind.
///
/// Scheduling a kind that is already pending moves its deadline. Due timers
/// pop one at a time in deadline order (ties broken by [`Timer`] order) so a
/// timer that fires can cancel the ones behind it.
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    deadlines: BTreeMap<Timer, Instant>,
}

impl TimerQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `timer` at `at`. Returns the deadline it replaced, if any.
    pub fn schedule(&mut self, timer: Timer, at: Instant) -> Option<Instant> {
        self.deadlines.insert(timer, at)
    }

    /// Disarm `timer`. Returns whether it was pending.
    pub fn cancel(&mut self, timer: Timer) -> bool {
        self.deadlines.remove(&timer).is_some()
    }

    /// Whether `timer` is armed.
    pub fn is_pending(&self, timer: Timer) -> bool {
        self.deadlines.contains_key(&timer)
    }

    /// Deadline of `timer`, if armed.
    pub fn deadline(&self, timer: Timer) -> Option<Instant> {
        self.deadlines.get(&timer).copied()
    }

    /// Earliest armed deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return the earliest timer due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<Timer> {
        let (timer, _) = self
            .deadlines
            .iter()
            .filter(|(_, at)| **at <= now)
            .min_by_key(|(timer, at)| (**at, **timer))?;
        let timer = *timer;
        self.deadlines.remove(&timer);
        Some(timer)
    }

    /// Number of armed timers.
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    /// Whether no timer is armed.
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

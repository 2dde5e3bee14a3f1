//! Virtual clock.

use std::{
    cell::Cell,
    future::{self, Future},
    rc::Rc,
    time::{Duration, Instant},
};

use appshim_core::Environment;

/// Environment whose clock only moves when someone sleeps or advances it.
///
/// Sleeping completes immediately after moving the clock forward, so a
/// runtime driven by [`SimEnv`] jumps straight from one deadline to the
/// next. Clones share the clock.
#[derive(Debug, Clone)]
pub struct SimEnv {
    start: Instant,
    elapsed: Rc<Cell<Duration>>,
}

impl SimEnv {
    /// Clock starting at the current instant.
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed: Rc::default() }
    }

    /// Instant the clock started at.
    pub fn start(&self) -> Instant {
        self.start
    }

    /// Virtual time elapsed since the start.
    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: Duration) {
        self.elapsed.set(self.elapsed.get() + duration);
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    fn now(&self) -> Instant {
        self.start + self.elapsed.get()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        self.advance(duration);
        future::ready(())
    }
}

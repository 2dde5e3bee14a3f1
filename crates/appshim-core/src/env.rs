//! Environment abstraction.
//!
//! The core never reads the clock or sleeps on its own. Drivers supply time
//! through this trait so simulation can substitute a virtual clock for the
//! system one.

use std::{
    future::Future,
    time::{Duration, Instant},
};

/// Source of time for the runtime loop.
///
/// Implementations are single-threaded: the proxy runs on one execution
/// context, so neither the environment nor its futures need to be `Send`.
pub trait Environment {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Resolve after `duration` has elapsed.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

//! Actions produced by proxy state transitions.
//!
//! The proxy never schedules, loads, or calls into the discovery handler
//! itself. It returns these actions and the driver executes them in order.

use std::time::Duration;

/// Fire-once timers the proxy relies on.
///
/// At most one timer of each kind is pending at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Timer {
    /// Poll the host for readiness and bootstrap.
    Bootstrap,
    /// Hand over from bootstrap to the loader.
    PrepareDiscovery,
    /// First load attempt after the settle delay.
    Discover,
    /// Safety timeout of an in-flight load.
    LoadTimeout,
    /// Retry after a load raised.
    LoadRetry,
}

/// Effects for the driver to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Arm `timer` to fire after `after`, replacing a pending one.
    Schedule {
        /// Timer to arm.
        timer: Timer,
        /// Delay from now.
        after: Duration,
    },

    /// Disarm `timer` if pending.
    Cancel(Timer),

    /// Start loading the discovery handler script.
    LoadScript {
        /// Script path.
        path: String,
    },

    /// Ask the loaded handler for its applications.
    RetrieveApplications,
}

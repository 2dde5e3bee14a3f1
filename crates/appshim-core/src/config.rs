//! Proxy configuration.

use std::time::Duration;

use crate::IdentityTable;

/// How a load that raised (rather than timing out) is accounted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExceptionPolicy {
    /// A raised load uses up an attempt, like a timeout. The whole retry loop
    /// stays bounded by `max_attempts`.
    #[default]
    CountTowardsCap,
    /// A raised load is retried after the retry interval without touching
    /// the attempt counter.
    Unbounded,
}

/// Delays driving bootstrap and discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timing {
    /// Interval between bootstrap polls while the host is not ready.
    pub bootstrap_poll: Duration,
    /// Delay between a completed bootstrap and scheduling discovery.
    pub discovery_delay: Duration,
    /// Settle delay before the first load attempt.
    pub settle_delay: Duration,
    /// Settle delay before the first load attempt in debug mode.
    pub debug_settle_delay: Duration,
    /// Safety timeout of a load attempt, and delay before retrying a raised
    /// load.
    pub retry_interval: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            bootstrap_poll: Duration::from_secs(2),
            discovery_delay: Duration::from_millis(20),
            settle_delay: Duration::from_secs(5),
            debug_settle_delay: Duration::from_millis(500),
            retry_interval: Duration::from_secs(10),
        }
    }
}

/// Proxy configuration
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Identities involved in translation
    pub identities: IdentityTable,
    /// Timer delays
    pub timing: Timing,
    /// Load attempts before discovery is abandoned for the process lifetime
    pub max_attempts: u32,
    /// Script providing the discovery handler
    pub runtime_script: String,
    /// Accounting of raised loads
    pub exception_policy: ExceptionPolicy,
    /// Shortens the settle delay
    pub debug: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            identities: IdentityTable::default(),
            timing: Timing::default(),
            max_attempts: 20,
            runtime_script: "apps/custom/runtime/runtime.js".to_string(),
            exception_policy: ExceptionPolicy::default(),
            debug: false,
        }
    }
}

impl ProxyConfig {
    /// Settle delay in effect for the current mode.
    pub fn settle_delay(&self) -> Duration {
        if self.debug { self.timing.debug_settle_delay } else { self.timing.settle_delay }
    }
}

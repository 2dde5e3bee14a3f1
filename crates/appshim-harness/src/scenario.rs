//! Scenario builder.
//!
//! Wires a [`Runtime`] to a [`SimHost`] and a [`SimScriptLoader`] on a
//! [`SimEnv`] clock and advances virtual time deadline by deadline.

use std::time::{Duration, Instant};

use appshim_core::{Environment, ProxyConfig, Runtime};

use crate::{SimEnv, SimHost, SimScriptLoader};

/// Runtime type every scenario drives.
pub type SimRuntime = Runtime<SimHost, SimScriptLoader>;

/// Scenario configuration.
#[derive(Debug)]
pub struct Scenario {
    config: ProxyConfig,
    scripts: SimScriptLoader,
    boot_after: Option<Duration>,
    announce_load: bool,
}

impl Scenario {
    /// Booted host, default configuration, a script that never loads.
    pub fn new() -> Self {
        Self {
            config: ProxyConfig::default(),
            scripts: SimScriptLoader::never(),
            boot_after: None,
            announce_load: false,
        }
    }

    /// Use `config`.
    #[must_use]
    pub fn config(mut self, config: ProxyConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `scripts` to load the discovery handler.
    #[must_use]
    pub fn scripts(mut self, scripts: SimScriptLoader) -> Self {
        self.scripts = scripts;
        self
    }

    /// Host keeps starting for `delay` before the system application comes
    /// up.
    #[must_use]
    pub fn boot_after(mut self, delay: Duration) -> Self {
        self.boot_after = Some(delay);
        self
    }

    /// Host announces its load event when it finishes booting.
    #[must_use]
    pub fn announce_load(mut self) -> Self {
        self.announce_load = true;
        self
    }

    /// Build the world, clock at zero.
    pub fn build(self) -> World {
        let env = SimEnv::new();
        let host = if self.boot_after.is_some() { SimHost::new() } else { SimHost::booted() };
        let runtime = Runtime::new(self.config, host, self.scripts, env.now());
        let boot_at = self.boot_after.map(|delay| env.now() + delay);

        World { runtime, env, boot_at, announce_load: self.announce_load }
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

/// A running scenario.
#[derive(Debug)]
pub struct World {
    runtime: SimRuntime,
    env: SimEnv,
    boot_at: Option<Instant>,
    announce_load: bool,
}

impl World {
    /// Runtime under test.
    pub fn runtime(&self) -> &SimRuntime {
        &self.runtime
    }

    /// Mutable runtime under test.
    pub fn runtime_mut(&mut self) -> &mut SimRuntime {
        &mut self.runtime
    }

    /// Simulated host.
    pub fn host(&self) -> &SimHost {
        self.runtime.host()
    }

    /// Mutable simulated host.
    pub fn host_mut(&mut self) -> &mut SimHost {
        self.runtime.host_mut()
    }

    /// Script loader.
    pub fn scripts(&self) -> &SimScriptLoader {
        self.runtime.scripts()
    }

    /// Virtual clock.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Virtual time elapsed since the world was built.
    pub fn elapsed(&self) -> Duration {
        self.env.elapsed()
    }

    /// Advance virtual time by `duration`, firing everything due on the way.
    pub fn run_for(&mut self, duration: Duration) {
        let end = self.env.now() + duration;

        loop {
            let now = self.env.now();
            self.boot_if_due(now);
            self.runtime.poll(now);

            match self.next_event() {
                Some(at) if at <= end => self.env.advance(at.saturating_duration_since(now)),
                _ => break,
            }
        }

        self.env.advance(end.saturating_duration_since(self.env.now()));
    }

    /// Run for at most `limit`. Returns whether the runtime went idle.
    pub fn run_to_idle(&mut self, limit: Duration) -> bool {
        self.run_for(limit);
        self.next_event().is_none()
    }

    fn next_event(&self) -> Option<Instant> {
        [self.runtime.next_deadline(), self.boot_at].into_iter().flatten().min()
    }

    fn boot_if_due(&mut self, now: Instant) {
        if self.boot_at.is_some_and(|at| at <= now) {
            self.boot_at = None;
            self.runtime.host_mut().boot();
            if self.announce_load {
                self.runtime.host_loaded(now);
            }
        }
    }
}

//! Bounded-retry discovery handler loading.
//!
//! ```text
//!   Idle ──settle──▶ Discovering ──handler present / loaded──▶ Available
//!                     │    ▲
//!     timeout, raise  │    │  attempts < max
//!                     └────┘
//!                     │
//!                     └──attempts == max──▶ Exhausted
//! ```
//!
//! `Available` and `Exhausted` are terminal. Every attempt arms a safety
//! timer since a script that never calls back looks exactly like a slow one.
//! The timer firing counts as a failed attempt and starts the next attempt
//! right away, so consecutive attempts are one retry interval apart.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{Action, ExceptionPolicy, LoadError, ProxyConfig, Timer};

/// Loader lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderState {
    /// Discovery not started.
    Idle,
    /// Load attempts in flight.
    Discovering,
    /// Handler available, applications requested. Terminal.
    Available,
    /// Attempts exhausted. Terminal for the process lifetime.
    Exhausted,
}

/// Bookkeeping of an ongoing discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadAttemptState {
    /// Failed attempts so far.
    pub attempts: u32,
    /// Whether the handler turned up.
    pub handler_available: bool,
    /// Timer the loader is waiting on.
    pub pending_timer: Option<Timer>,
}

/// Loader state machine.
///
/// Transitions take whether a handler is present as a parameter and return
/// the actions to execute; the loader itself never touches timers or
/// scripts.
#[derive(Debug, Clone)]
pub struct Loader {
    state: LoaderState,
    scheduled: bool,
    attempt: LoadAttemptState,
    max_attempts: u32,
    settle_delay: Duration,
    retry_interval: Duration,
    script: String,
    policy: ExceptionPolicy,
}

impl Loader {
    /// Idle loader.
    pub fn new(config: &ProxyConfig) -> Self {
        Self {
            state: LoaderState::Idle,
            scheduled: false,
            attempt: LoadAttemptState {
                attempts: 0,
                handler_available: false,
                pending_timer: None,
            },
            max_attempts: config.max_attempts,
            settle_delay: config.settle_delay(),
            retry_interval: config.timing.retry_interval,
            script: config.runtime_script.clone(),
            policy: config.exception_policy,
        }
    }

    /// Current state.
    pub fn state(&self) -> LoaderState {
        self.state
    }

    /// Failed attempts so far.
    pub fn attempts(&self) -> u32 {
        self.attempt.attempts
    }

    /// Attempt bookkeeping, from scheduling until a terminal state.
    pub fn attempt_state(&self) -> Option<LoadAttemptState> {
        match self.state {
            LoaderState::Idle if self.scheduled => Some(self.attempt),
            LoaderState::Discovering => Some(self.attempt),
            _ => None,
        }
    }

    /// Schedule the first attempt after the settle delay. Only the first call
    /// has an effect.
    pub fn schedule(&mut self) -> Vec<Action> {
        if self.state != LoaderState::Idle || self.scheduled {
            return Vec::new();
        }

        self.scheduled = true;
        self.attempt.pending_timer = Some(Timer::Discover);
        debug!(after = ?self.settle_delay, "discovery scheduled");
        vec![Action::Schedule { timer: Timer::Discover, after: self.settle_delay }]
    }

    /// Start an attempt.
    ///
    /// A handler that is already present short-circuits straight to
    /// `Available`.
    pub fn attempt(&mut self, handler_present: bool) -> Vec<Action> {
        if self.is_terminal() {
            return Vec::new();
        }
        if handler_present {
            return self.become_available();
        }
        if self.attempt.attempts >= self.max_attempts {
            self.exhaust();
            return vec![Action::Cancel(Timer::LoadTimeout)];
        }

        self.state = LoaderState::Discovering;
        self.attempt.pending_timer = Some(Timer::LoadTimeout);
        debug!(
            attempt = self.attempt.attempts + 1,
            script = %self.script,
            "loading discovery handler"
        );

        vec![
            Action::Cancel(Timer::LoadTimeout),
            Action::Schedule { timer: Timer::LoadTimeout, after: self.retry_interval },
            Action::LoadScript { path: self.script.clone() },
        ]
    }

    /// The script called back with the handler.
    pub fn load_succeeded(&mut self) -> Vec<Action> {
        if self.state != LoaderState::Discovering {
            return Vec::new();
        }
        self.become_available()
    }

    /// The safety timer of the current attempt fired.
    pub fn load_timed_out(&mut self, handler_present: bool) -> Vec<Action> {
        if self.state != LoaderState::Discovering {
            return Vec::new();
        }
        if handler_present {
            return self.become_available();
        }

        self.attempt.attempts += 1;
        if self.attempt.attempts < self.max_attempts {
            warn!(
                attempts = self.attempt.attempts,
                max = self.max_attempts,
                "discovery handler load timed out, retrying"
            );
            return self.attempt(false);
        }

        self.exhaust();
        Vec::new()
    }

    /// Loading the script raised.
    pub fn load_raised(&mut self, error: &LoadError) -> Vec<Action> {
        if self.state != LoaderState::Discovering {
            return Vec::new();
        }

        if self.policy == ExceptionPolicy::CountTowardsCap {
            self.attempt.attempts += 1;
            if self.attempt.attempts >= self.max_attempts {
                self.exhaust();
                return vec![Action::Cancel(Timer::LoadTimeout)];
            }
        }

        warn!(
            %error,
            attempts = self.attempt.attempts,
            after = ?self.retry_interval,
            "discovery handler load raised, retrying"
        );
        self.attempt.pending_timer = Some(Timer::LoadRetry);
        vec![
            Action::Cancel(Timer::LoadTimeout),
            Action::Schedule { timer: Timer::LoadRetry, after: self.retry_interval },
        ]
    }

    fn become_available(&mut self) -> Vec<Action> {
        self.state = LoaderState::Available;
        self.attempt.handler_available = true;
        self.attempt.pending_timer = None;
        info!(attempts = self.attempt.attempts, "discovery handler available");

        vec![
            Action::Cancel(Timer::LoadTimeout),
            Action::Cancel(Timer::LoadRetry),
            Action::RetrieveApplications,
        ]
    }

    fn exhaust(&mut self) {
        self.state = LoaderState::Exhausted;
        self.attempt.pending_timer = None;
        warn!(attempts = self.attempt.attempts, "giving up on discovery handler");
    }

    fn is_terminal(&self) -> bool {
        matches!(self.state, LoaderState::Available | LoaderState::Exhausted)
    }
}

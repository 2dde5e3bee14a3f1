//! Generic driver loop.
//!
//! [`Runtime`] owns the [`Proxy`], the host handle, the script loader and the
//! timer queue, and executes the actions proxy transitions return. Script
//! and handler callbacks may complete synchronously or much later; either
//! way they only push a completion into the inbox, which the runtime drains
//! after every step. Nothing the proxy does ever re-enters it.
//!
//! The same loop runs against a real host with wall-clock time and against
//! the simulation harness with virtual time.

use std::{cell::RefCell, collections::VecDeque, rc::Rc, time::Instant};

use appshim_proto::AppDescriptor;
use tracing::{debug, trace, warn};

use crate::{
    Action, DiscoveryHandler, Environment, Host, LoadCallback, LoaderState, Proxy, ProxyConfig,
    RetrieveCallback, ScriptLoader, Timer, TimerQueue,
};

/// Asynchronous results waiting to be fed back into the proxy.
enum Completion {
    HandlerLoaded(Box<dyn DiscoveryHandler>),
    ApplicationsRetrieved(Vec<AppDescriptor>),
}

type Inbox = Rc<RefCell<VecDeque<Completion>>>;

/// Drives a [`Proxy`] against a host and a script loader.
pub struct Runtime<H, L> {
    proxy: Proxy,
    host: H,
    scripts: L,
    timers: TimerQueue,
    inbox: Inbox,
    now: Instant,
}

impl<H: Host, L: ScriptLoader> Runtime<H, L> {
    /// Runtime whose first bootstrap poll is due at `now`.
    pub fn new(config: ProxyConfig, host: H, scripts: L, now: Instant) -> Self {
        let mut timers = TimerQueue::new();
        timers.schedule(Timer::Bootstrap, now);

        Self { proxy: Proxy::new(config), host, scripts, timers, inbox: Inbox::default(), now }
    }

    /// The host finished loading. Bootstraps right away instead of waiting
    /// for the next poll.
    pub fn host_loaded(&mut self, now: Instant) {
        self.now = now;
        let actions = self.proxy.bootstrap(&mut self.host);
        if self.proxy.is_bootstrapped() {
            self.timers.cancel(Timer::Bootstrap);
        }
        self.execute(actions);
        self.drain_inbox();
    }

    /// Fire every timer due at `now` and process everything that follows.
    ///
    /// Returns the number of timers fired and completions handled.
    pub fn poll(&mut self, now: Instant) -> usize {
        self.now = now;
        let mut steps = self.drain_inbox();

        while let Some(timer) = self.timers.pop_due(now) {
            trace!(?timer, "timer fired");
            self.fire(timer);
            steps += 1 + self.drain_inbox();
        }

        steps
    }

    /// Earliest pending timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Poll until `done` holds, sleeping through `env` between deadlines.
    ///
    /// Returns `false` if the runtime went idle (no timer pending) before
    /// `done` held.
    pub async fn run_until<E, F>(&mut self, env: &E, mut done: F) -> bool
    where
        E: Environment,
        F: FnMut(&Self) -> bool,
    {
        loop {
            self.poll(env.now());
            if done(self) {
                return true;
            }

            let Some(deadline) = self.next_deadline() else {
                debug!("runtime idle");
                return false;
            };
            env.sleep(deadline.saturating_duration_since(env.now())).await;
        }
    }

    /// Proxy state.
    pub fn proxy(&self) -> &Proxy {
        &self.proxy
    }

    /// Host handle.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host handle, for delivering calls through its entry points.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Script loader.
    pub fn scripts(&self) -> &L {
        &self.scripts
    }

    /// Mutable script loader.
    pub fn scripts_mut(&mut self) -> &mut L {
        &mut self.scripts
    }

    /// Pending timers.
    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    /// Whether the proxy bootstrapped.
    pub fn is_bootstrapped(&self) -> bool {
        self.proxy.is_bootstrapped()
    }

    /// Loader state.
    pub fn loader_state(&self) -> LoaderState {
        self.proxy.loader().state()
    }

    /// Failed load attempts so far.
    pub fn attempts(&self) -> u32 {
        self.proxy.loader().attempts()
    }

    fn fire(&mut self, timer: Timer) {
        let actions = self.proxy.handle_timer(timer, &mut self.host);

        // Keep polling until the host is ready.
        if timer == Timer::Bootstrap && !self.proxy.is_bootstrapped() {
            let poll = self.proxy.config().timing.bootstrap_poll;
            self.timers.schedule(Timer::Bootstrap, self.now + poll);
        }

        self.execute(actions);
    }

    fn execute(&mut self, actions: Vec<Action>) {
        let mut queue = VecDeque::from(actions);

        while let Some(action) = queue.pop_front() {
            match action {
                Action::Schedule { timer, after } => {
                    self.timers.schedule(timer, self.now + after);
                },
                Action::Cancel(timer) => {
                    self.timers.cancel(timer);
                },
                Action::LoadScript { path } => {
                    let inbox = self.inbox.clone();
                    let on_loaded: LoadCallback =
                        Box::new(move |handler: Box<dyn DiscoveryHandler>| {
                            inbox.borrow_mut().push_back(Completion::HandlerLoaded(handler));
                        });
                    if let Err(error) = self.scripts.load_external(&path, on_loaded) {
                        queue.extend(self.proxy.load_raised(&error));
                    }
                },
                Action::RetrieveApplications => {
                    let inbox = self.inbox.clone();
                    let deliver: RetrieveCallback = Box::new(move |items: Vec<AppDescriptor>| {
                        inbox.borrow_mut().push_back(Completion::ApplicationsRetrieved(items));
                    });
                    match self.proxy.handler().retrieve(deliver) {
                        Ok(true) => {},
                        Ok(false) => warn!("no discovery handler to retrieve applications from"),
                        Err(error) => self.proxy.retrieval_failed(&error),
                    }
                },
            }
        }
    }

    fn drain_inbox(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let next = self.inbox.borrow_mut().pop_front();
            let Some(completion) = next else {
                return handled;
            };
            handled += 1;

            match completion {
                Completion::HandlerLoaded(handler) => {
                    let actions = self.proxy.handler_loaded(handler);
                    self.execute(actions);
                },
                Completion::ApplicationsRetrieved(items) => {
                    self.proxy.register_applications(&mut self.host, items);
                },
            }
        }
    }
}

impl<H, L> std::fmt::Debug for Runtime<H, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("proxy", &self.proxy)
            .field("timers", &self.timers)
            .field("pending_completions", &self.inbox.try_borrow().map(|inbox| inbox.len()).ok())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use appshim_proto::{AppData, AppDescriptor, SelectionEvent};

    use super::*;
    use crate::{
        HostCall, LoadError,
        testing::{FakeHandler, FakeHost},
    };

    /// Script loader answering from a fixed script of outcomes.
    enum Outcome {
        Silent,
        Raise,
        Provide(FakeHandler),
    }

    struct ScriptedLoader {
        outcomes: VecDeque<Outcome>,
        loads: usize,
    }

    impl ScriptedLoader {
        fn new(outcomes: impl IntoIterator<Item = Outcome>) -> Self {
            Self { outcomes: outcomes.into_iter().collect(), loads: 0 }
        }
    }

    impl ScriptLoader for ScriptedLoader {
        fn load_external(&mut self, path: &str, on_loaded: LoadCallback) -> Result<(), LoadError> {
            self.loads += 1;
            match self.outcomes.pop_front().unwrap_or(Outcome::Silent) {
                Outcome::Silent => Ok(()),
                Outcome::Raise => Err(LoadError::new(path, "unexpected token")),
                Outcome::Provide(handler) => {
                    on_loaded(Box::new(handler));
                    Ok(())
                },
            }
        }
    }

    fn apps() -> Vec<AppDescriptor> {
        vec![
            AppDescriptor::new("app.demo", "SelectCustomApplication", "Demo"),
            AppDescriptor::new("app.clock", "SelectCustomApplication", "Clock"),
        ]
    }

    /// Advance virtual time one deadline at a time until idle or `limit`.
    fn run_to_idle<H: Host, L: ScriptLoader>(
        runtime: &mut Runtime<H, L>,
        t0: Instant,
        limit: Duration,
    ) {
        runtime.poll(t0);
        while let Some(deadline) = runtime.next_deadline() {
            if deadline > t0 + limit {
                break;
            }
            runtime.poll(deadline);
        }
    }

    #[test]
    fn polls_until_host_is_ready() {
        let t0 = Instant::now();
        let mut runtime =
            Runtime::new(ProxyConfig::default(), FakeHost::starting(), ScriptedLoader::new([]), t0);

        runtime.poll(t0);
        assert!(!runtime.is_bootstrapped());
        assert_eq!(runtime.timers().deadline(Timer::Bootstrap), Some(t0 + Duration::from_secs(2)));

        runtime.host_mut().active = Some("system".to_string());
        runtime.host_mut().instances.insert("system".to_string());
        runtime.poll(t0 + Duration::from_secs(2));

        assert!(runtime.is_bootstrapped());
        assert!(!runtime.timers().is_pending(Timer::Bootstrap));
        assert!(runtime.timers().is_pending(Timer::PrepareDiscovery));
    }

    #[test]
    fn host_load_event_bootstraps_immediately() {
        let t0 = Instant::now();
        let mut runtime =
            Runtime::new(ProxyConfig::default(), FakeHost::ready(), ScriptedLoader::new([]), t0);

        runtime.host_loaded(t0);

        assert!(runtime.is_bootstrapped());
        assert!(!runtime.timers().is_pending(Timer::Bootstrap));
    }

    #[test]
    fn successful_load_registers_applications() {
        let t0 = Instant::now();
        let scripts = ScriptedLoader::new([Outcome::Provide(FakeHandler::accepting(apps()))]);
        let mut runtime = Runtime::new(ProxyConfig::default(), FakeHost::ready(), scripts, t0);

        run_to_idle(&mut runtime, t0, Duration::from_secs(600));

        assert_eq!(runtime.loader_state(), LoaderState::Available);
        assert_eq!(runtime.scripts().loads, 1);
        assert_eq!(runtime.host().registry.len(), 2);
        assert!(runtime.timers().is_empty());
    }

    #[test]
    fn silent_script_is_abandoned_after_twenty_loads() {
        let t0 = Instant::now();
        let mut runtime =
            Runtime::new(ProxyConfig::default(), FakeHost::ready(), ScriptedLoader::new([]), t0);

        run_to_idle(&mut runtime, t0, Duration::from_secs(3600));

        assert_eq!(runtime.scripts().loads, 20);
        assert_eq!(runtime.loader_state(), LoaderState::Exhausted);
        assert!(runtime.host().registry.is_empty());
        assert!(runtime.next_deadline().is_none());
    }

    #[test]
    fn raised_load_retries_after_interval() {
        let t0 = Instant::now();
        let scripts =
            ScriptedLoader::new([Outcome::Raise, Outcome::Provide(FakeHandler::accepting(apps()))]);
        let mut runtime = Runtime::new(ProxyConfig::default(), FakeHost::ready(), scripts, t0);

        // Bootstrap, 20ms handover, 5s settle: the first load raises.
        run_to_idle(&mut runtime, t0, Duration::from_secs(6));
        assert_eq!(runtime.scripts().loads, 1);
        assert!(runtime.timers().is_pending(Timer::LoadRetry));
        assert!(!runtime.timers().is_pending(Timer::LoadTimeout));

        run_to_idle(&mut runtime, t0, Duration::from_secs(60));
        assert_eq!(runtime.scripts().loads, 2);
        assert_eq!(runtime.loader_state(), LoaderState::Available);
        assert_eq!(runtime.attempts(), 1);
    }

    #[test]
    fn retrieval_failure_leaves_discovery_settled() {
        let t0 = Instant::now();
        let scripts = ScriptedLoader::new([Outcome::Provide(FakeHandler::failing_retrieve())]);
        let mut runtime = Runtime::new(ProxyConfig::default(), FakeHost::ready(), scripts, t0);

        run_to_idle(&mut runtime, t0, Duration::from_secs(600));

        assert_eq!(runtime.loader_state(), LoaderState::Available);
        assert!(runtime.host().registry.is_empty());
        assert!(runtime.next_deadline().is_none());
    }

    #[test]
    fn launch_after_discovery_is_disguised() {
        let t0 = Instant::now();
        let handler = FakeHandler::accepting(apps());
        let launches = handler.launches();
        let scripts = ScriptedLoader::new([Outcome::Provide(handler)]);
        let mut runtime = Runtime::new(ProxyConfig::default(), FakeHost::ready(), scripts, t0);
        run_to_idle(&mut runtime, t0, Duration::from_secs(600));

        let app_data = AppData::new("app.demo", "SelectCustomApplication");
        runtime.host_mut().call(HostCall::ListSelect(SelectionEvent::new("List2Ctrl", app_data)));

        assert_eq!(launches.borrow().len(), 1);
        let delivered = runtime.host().delivered();
        let HostCall::ListSelect(selection) = &delivered[0] else { panic!("wrong entry point") };
        assert_eq!(selection.app_data.app_name, "vdt");
    }
}

//! Bootstrap sequencing and the proxy context object.
//!
//! [`Proxy`] is the single owner of everything the proxy remembers: the
//! bootstrapped flag, which hooks are installed, the loader state, and the
//! discovery handler slot shared with the router. It is created once per
//! process and driven through its methods; time and the host are passed in.

use std::rc::Rc;

use appshim_proto::AppDescriptor;
use tracing::{debug, info, trace, warn};

use crate::{
    Action, DiscoveryHandler, EntryPoint, HandlerError, HandlerSlot, HookInstaller, Host,
    IdentityTable, LoadError, Loader, LoaderState, ProxyConfig, Router, Timer,
};

/// Proxy context.
#[derive(Debug)]
pub struct Proxy {
    config: ProxyConfig,
    identities: Rc<IdentityTable>,
    router: Router,
    hooks: HookInstaller,
    loader: Loader,
    handler: HandlerSlot,
    bootstrapped: bool,
}

impl Proxy {
    /// Proxy that has not bootstrapped yet.
    pub fn new(config: ProxyConfig) -> Self {
        let identities = Rc::new(config.identities.clone());
        let handler = HandlerSlot::new();
        let router = Router::new(identities.clone(), handler.clone());
        let loader = Loader::new(&config);

        Self {
            config,
            identities,
            router,
            hooks: HookInstaller::new(),
            loader,
            handler,
            bootstrapped: false,
        }
    }

    /// Whether bootstrap completed.
    pub fn is_bootstrapped(&self) -> bool {
        self.bootstrapped
    }

    /// Configuration.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Identities in use.
    pub fn identities(&self) -> &IdentityTable {
        &self.identities
    }

    /// Router backing the installed wrappers.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Hook installation records.
    pub fn hooks(&self) -> &HookInstaller {
        &self.hooks
    }

    /// Loader state machine.
    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Discovery handler slot.
    pub fn handler(&self) -> &HandlerSlot {
        &self.handler
    }

    /// Install the proxy into `host` if the host is ready.
    ///
    /// Safe to call any number of times: effects happen at most once, and a
    /// host that is not ready yet is a silent no-op. The host is ready once
    /// its active application is the system application and a live instance
    /// of it exists.
    ///
    /// A hook that fails to install aborts the attempt with bootstrap still
    /// incomplete. Hooks installed so far stay installed and are skipped by
    /// the next attempt.
    pub fn bootstrap<H: Host>(&mut self, host: &mut H) -> Vec<Action> {
        if self.bootstrapped {
            return Vec::new();
        }

        let system = &self.identities.system;
        if host.active_app() != Some(system.app_id.as_str()) {
            trace!(active = ?host.active_app(), "host not ready");
            return Vec::new();
        }
        if !host.has_app_instance(&system.app_id) {
            trace!(app = %system.app_id, "system instance not available yet");
            return Vec::new();
        }

        for point in EntryPoint::ALL {
            let router = &self.router;
            if let Err(error) = self.hooks.install(host, point, |original| router.wrap(original)) {
                warn!(%error, "bootstrap incomplete");
                return Vec::new();
            }
        }

        let identities = &self.identities;
        host.set_template_category(
            &identities.surface_template,
            &identities.surface_template_category,
        );
        self.bootstrapped = true;
        info!(
            proxy = %identities.proxy.app_id,
            target = %identities.target.app_id,
            "proxy bootstrapped"
        );

        let after = self.config.timing.discovery_delay;
        vec![Action::Schedule { timer: Timer::PrepareDiscovery, after }]
    }

    /// React to a timer firing.
    pub fn handle_timer<H: Host>(&mut self, timer: Timer, host: &mut H) -> Vec<Action> {
        match timer {
            Timer::Bootstrap => self.bootstrap(host),
            Timer::PrepareDiscovery => self.loader.schedule(),
            Timer::Discover | Timer::LoadRetry => self.loader.attempt(self.handler.is_loaded()),
            Timer::LoadTimeout => self.loader.load_timed_out(self.handler.is_loaded()),
        }
    }

    /// The discovery handler script called back.
    ///
    /// A handler arriving after discovery was settled is dropped.
    pub fn handler_loaded(&mut self, handler: Box<dyn DiscoveryHandler>) -> Vec<Action> {
        if self.loader.state() != LoaderState::Discovering {
            warn!(state = ?self.loader.state(), "discarding late discovery handler");
            return Vec::new();
        }

        self.handler.install(handler);
        self.loader.load_succeeded()
    }

    /// Loading the discovery handler script raised.
    pub fn load_raised(&mut self, error: &LoadError) -> Vec<Action> {
        self.loader.load_raised(error)
    }

    /// The handler failed to enumerate applications.
    ///
    /// Unlike a failed load this does not feed the retry loop. The loader is
    /// already `Available`, which is terminal, so the failure is only logged
    /// and nothing is registered.
    pub fn retrieval_failed(&self, error: &HandlerError) {
        warn!(%error, "application retrieval failed");
    }

    /// Register discovered applications with the host: registry entry,
    /// localized title and context category. Returns how many were
    /// registered.
    ///
    /// Skipped when the system application instance is gone.
    pub fn register_applications<H: Host>(
        &self,
        host: &mut H,
        items: Vec<AppDescriptor>,
    ) -> usize {
        let system = &self.identities.system;
        if !host.has_app_instance(&system.app_id) {
            warn!(
                app = %system.app_id,
                count = items.len(),
                "system instance gone, applications not registered"
            );
            return 0;
        }

        let count = items.len();
        for item in items {
            let name = item.app_name().to_string();
            let category =
                item.category.clone().unwrap_or_else(|| self.identities.system_category.clone());

            host.insert_localized_title(
                &system.app_id,
                IdentityTable::localization_key(&name),
                item.title.clone(),
            );
            host.insert_context_category(IdentityTable::category_pattern(&name), category);
            host.append_application(item);
            debug!(app = %name, "application registered");
        }

        info!(count, "custom applications registered");
        count
    }
}

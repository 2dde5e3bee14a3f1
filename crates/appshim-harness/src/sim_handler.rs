//! Simulated discovery handler.

use std::{cell::RefCell, rc::Rc};

use appshim_core::{DiscoveryHandler, HandlerError, RetrieveCallback};
use appshim_proto::{AppData, AppDescriptor};
use tracing::debug;

/// Descriptors for `count` custom applications named `app.sample<n>`.
pub fn sample_apps(count: usize) -> Vec<AppDescriptor> {
    (1..=count)
        .map(|n| {
            AppDescriptor::new(
                format!("app.sample{n}"),
                "SelectCustomApplication",
                format!("Sample {n}"),
            )
        })
        .collect()
}

/// Discovery handler with a fixed application list.
///
/// Clones share the launch log, so a test can keep a clone while the
/// original disappears into a script loader.
#[derive(Debug, Clone)]
pub struct SimDiscoveryHandler {
    apps: Vec<AppDescriptor>,
    accept: bool,
    fail_retrieve: bool,
    launches: Rc<RefCell<Vec<AppData>>>,
}

impl SimDiscoveryHandler {
    /// Handler that accepts every launch and lists `apps`.
    pub fn new(apps: Vec<AppDescriptor>) -> Self {
        Self { apps, accept: true, fail_retrieve: false, launches: Rc::default() }
    }

    /// Make the handler decline every launch.
    #[must_use]
    pub fn declining(mut self) -> Self {
        self.accept = false;
        self
    }

    /// Make enumeration fail.
    #[must_use]
    pub fn failing_retrieve(mut self) -> Self {
        self.fail_retrieve = true;
        self
    }

    /// Launch requests seen so far, as the user made them.
    pub fn launches(&self) -> Vec<AppData> {
        self.launches.borrow().clone()
    }
}

impl DiscoveryHandler for SimDiscoveryHandler {
    fn launch(&mut self, app: &AppData) -> bool {
        debug!(app = %app.app_name, accept = self.accept, "launch requested");
        self.launches.borrow_mut().push(app.clone());
        self.accept
    }

    fn retrieve(&mut self, deliver: RetrieveCallback) -> Result<(), HandlerError> {
        if self.fail_retrieve {
            return Err(HandlerError("application list unreadable".to_string()));
        }
        deliver(self.apps.clone());
        Ok(())
    }
}

//! Simulated host framework.
//!
//! The host's own entry points behave like a minimal framework: context
//! changes arriving from the transport switch the active application, and
//! outbound events are stamped with the identity of the application that
//! is active when they are sent. Everything reaching an original
//! implementation is recorded in a [`HostLog`].

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
    rc::Rc,
};

use appshim_core::{EntryPoint, Handler, Host, HostCall, HostError};
use appshim_proto::{
    AppData, AppDescriptor, Dispatch, Identity, OutboundEvent, ProtocolError, RoutedMessage,
    SelectionEvent, StatusMessage,
};
use tracing::{debug, trace};

/// List control of the system application's menu.
pub const APPLICATIONS_LIST: &str = "_applicationsList";

/// Calls that reached the host's original entry points.
#[derive(Debug, Clone, Default)]
pub struct HostLog {
    /// Menu selections, as the host saw them.
    pub selections: Vec<SelectionEvent>,
    /// USB-audio status messages.
    pub status: Vec<StatusMessage>,
    /// Messages routed to applications.
    pub routed: Vec<RoutedMessage>,
    /// Events handed to the transport.
    pub sent: Vec<Dispatch>,
}

#[derive(Debug, Default)]
struct Shared {
    log: HostLog,
    switch_to: Option<Identity>,
}

/// In-memory host framework.
pub struct SimHost {
    active: Option<Identity>,
    shared: Rc<RefCell<Shared>>,
    instances: BTreeSet<String>,
    slots: BTreeMap<EntryPoint, Handler>,
    overrides: BTreeMap<EntryPoint, usize>,
    /// Template category table.
    pub templates: BTreeMap<String, String>,
    /// Application registry behind the system menu.
    pub registry: Vec<AppDescriptor>,
    /// Localization dictionaries per application.
    pub dictionaries: BTreeMap<String, BTreeMap<String, String>>,
    /// Context category table.
    pub categories: BTreeMap<String, String>,
}

impl SimHost {
    /// Host that is still starting: no active application, no instances.
    pub fn new() -> Self {
        let shared = Rc::new(RefCell::new(Shared::default()));
        let slots = EntryPoint::ALL.iter().map(|&point| (point, native(point, &shared))).collect();

        Self {
            active: None,
            shared,
            instances: BTreeSet::new(),
            slots,
            overrides: BTreeMap::new(),
            templates: BTreeMap::new(),
            registry: Vec::new(),
            dictionaries: BTreeMap::new(),
            categories: BTreeMap::new(),
        }
    }

    /// Host that finished starting, showing its application list.
    pub fn booted() -> Self {
        let mut host = Self::new();
        host.boot();
        host
    }

    /// Finish starting: the system application comes up and becomes active.
    pub fn boot(&mut self) {
        self.instances.insert("system".to_string());
        self.set_active(Identity::new("system", "Applications"));
    }

    /// Make `identity` the active application and context.
    pub fn set_active(&mut self, identity: Identity) {
        self.active = Some(identity);
    }

    /// Active application and context.
    pub fn active(&self) -> Option<&Identity> {
        self.active.as_ref()
    }

    /// Tear down the live instance of `app_id`.
    pub fn kill_instance(&mut self, app_id: &str) {
        self.instances.remove(app_id);
    }

    /// Everything that reached the original entry points so far.
    pub fn log(&self) -> HostLog {
        self.shared.borrow().log.clone()
    }

    /// Number of overrides registered on `point`.
    pub fn overrides(&self, point: EntryPoint) -> usize {
        self.overrides.get(&point).copied().unwrap_or(0)
    }

    /// Drop the implementation behind `point`, as an older host build
    /// lacking that entry point would.
    pub fn remove_entry_point(&mut self, point: EntryPoint) {
        self.slots.remove(&point);
    }

    /// Put the native implementation back behind `point`.
    pub fn restore_entry_point(&mut self, point: EntryPoint) {
        self.slots.insert(point, native(point, &self.shared));
    }

    /// Call through `point` with whatever implementation is installed.
    pub fn call(&mut self, call: HostCall) {
        match self.slots.get_mut(&call.entry_point()) {
            Some(handler) => handler(call),
            None => trace!(entry_point = %call.entry_point(), "no implementation installed"),
        }

        if let Some(next) = self.shared.borrow_mut().switch_to.take() {
            debug!(app = %next.app_id, context = %next.context_id, "context switched");
            self.active = Some(next);
        }
    }

    /// The user picks `app` from the application list.
    pub fn select(&mut self, app: AppData) {
        self.call(HostCall::ListSelect(SelectionEvent::new(APPLICATIONS_LIST, app)));
    }

    /// The user picks the registered application named `app_name`. Returns
    /// `false` if no such application is registered.
    pub fn select_registered(&mut self, app_name: &str) -> bool {
        let Some(descriptor) = self.registry.iter().find(|d| d.app_name() == app_name) else {
            return false;
        };
        let app = descriptor.app_data.clone();
        self.select(app);
        true
    }

    /// The transport delivers `bytes`.
    pub fn receive(&mut self, bytes: &[u8]) -> Result<(), ProtocolError> {
        let msg = RoutedMessage::decode(bytes)?;
        self.route(msg);
        Ok(())
    }

    /// The transport delivers `msg`.
    pub fn route(&mut self, msg: RoutedMessage) {
        self.call(HostCall::RouteMessage(msg));
    }

    /// A USB-audio status message arrives.
    pub fn usb_audio(&mut self, msg: StatusMessage) {
        self.call(HostCall::UsbAudioStatus(msg));
    }

    /// The active application sends `event`. Returns `false` while no
    /// application is active.
    pub fn send_event(&mut self, event: OutboundEvent) -> bool {
        let Some(origin) = self.active.clone() else {
            return false;
        };
        self.call(HostCall::SendEvent(Dispatch { event, origin }));
        true
    }
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SimHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimHost")
            .field("active", &self.active)
            .field("instances", &self.instances)
            .field("overrides", &self.overrides)
            .field("registry", &self.registry.len())
            .finish_non_exhaustive()
    }
}

/// The host's own implementation of `point`.
fn native(point: EntryPoint, shared: &Rc<RefCell<Shared>>) -> Handler {
    let shared = shared.clone();
    Box::new(move |call| {
        let mut shared = shared.borrow_mut();
        match call {
            HostCall::ListSelect(event) => shared.log.selections.push(event),
            HostCall::UsbAudioStatus(msg) => shared.log.status.push(msg),
            HostCall::RouteMessage(msg) => {
                if let RoutedMessage::ContextChange(change) = &msg {
                    let entered = Identity::new(change.uia_id.clone(), change.ctxt_id.clone());
                    shared.switch_to = Some(entered);
                }
                shared.log.routed.push(msg);
            },
            HostCall::SendEvent(dispatch) => shared.log.sent.push(dispatch),
        }
        trace!(entry_point = %point, "delivered");
    })
}

impl Host for SimHost {
    fn active_app(&self) -> Option<&str> {
        self.active.as_ref().map(|id| id.app_id.as_str())
    }

    fn has_app_instance(&self, app_id: &str) -> bool {
        self.instances.contains(app_id)
    }

    fn register_override<F>(&mut self, point: EntryPoint, wrap: F) -> Result<(), HostError>
    where
        F: FnOnce(Handler) -> Handler,
    {
        let original = self.slots.remove(&point).ok_or(HostError::MissingEntryPoint(point))?;
        self.slots.insert(point, wrap(original));
        *self.overrides.entry(point).or_default() += 1;
        Ok(())
    }

    fn set_template_category(&mut self, template: &str, category: &str) {
        self.templates.insert(template.to_string(), category.to_string());
    }

    fn append_application(&mut self, descriptor: AppDescriptor) {
        self.registry.push(descriptor);
    }

    fn insert_localized_title(&mut self, app_id: &str, key: String, title: String) {
        self.dictionaries.entry(app_id.to_string()).or_default().insert(key, title);
    }

    fn insert_context_category(&mut self, pattern: String, category: String) {
        self.categories.insert(pattern, category);
    }
}

//! In-crate fakes for unit tests.

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap, HashSet},
    rc::Rc,
};

use appshim_proto::{AppData, AppDescriptor};

use crate::{
    DiscoveryHandler, EntryPoint, Handler, HandlerError, Host, HostCall, HostError,
    RetrieveCallback,
};

/// Host with recording originals behind every entry point.
pub struct FakeHost {
    pub active: Option<String>,
    pub instances: HashSet<String>,
    pub templates: BTreeMap<String, String>,
    pub registry: Vec<AppDescriptor>,
    pub dictionaries: BTreeMap<String, BTreeMap<String, String>>,
    pub categories: BTreeMap<String, String>,
    slots: HashMap<EntryPoint, Handler>,
    overrides: HashMap<EntryPoint, usize>,
    delivered: Rc<RefCell<Vec<HostCall>>>,
}

impl FakeHost {
    /// Host that has not finished starting up.
    pub fn starting() -> Self {
        let delivered = Rc::new(RefCell::new(Vec::new()));
        let slots = EntryPoint::ALL.iter().map(|&point| (point, recording(&delivered))).collect();

        Self {
            active: None,
            instances: HashSet::new(),
            templates: BTreeMap::new(),
            registry: Vec::new(),
            dictionaries: BTreeMap::new(),
            categories: BTreeMap::new(),
            slots,
            overrides: HashMap::new(),
            delivered,
        }
    }

    /// Host with the system application active.
    pub fn ready() -> Self {
        let mut host = Self::starting();
        host.active = Some("system".to_string());
        host.instances.insert("system".to_string());
        host
    }

    pub fn call(&mut self, call: HostCall) {
        if let Some(handler) = self.slots.get_mut(&call.entry_point()) {
            handler(call);
        }
    }

    /// Calls that reached the host's own handlers.
    pub fn delivered(&self) -> Vec<HostCall> {
        self.delivered.borrow().clone()
    }

    /// Number of overrides registered on `point`.
    pub fn overrides(&self, point: EntryPoint) -> usize {
        self.overrides.get(&point).copied().unwrap_or(0)
    }

    pub fn remove_entry_point(&mut self, point: EntryPoint) {
        self.slots.remove(&point);
    }

    pub fn restore_entry_point(&mut self, point: EntryPoint) {
        self.slots.insert(point, recording(&self.delivered));
    }
}

fn recording(sink: &Rc<RefCell<Vec<HostCall>>>) -> Handler {
    let sink = sink.clone();
    Box::new(move |call| sink.borrow_mut().push(call))
}

impl Host for FakeHost {
    fn active_app(&self) -> Option<&str> {
        self.active.as_deref()
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

/// Discovery handler answering synchronously.
pub struct FakeHandler {
    accept: bool,
    items: Vec<AppDescriptor>,
    fail_retrieve: bool,
    launches: Rc<RefCell<Vec<AppData>>>,
}

impl FakeHandler {
    pub fn accepting(items: Vec<AppDescriptor>) -> Self {
        Self { accept: true, items, fail_retrieve: false, launches: Rc::default() }
    }

    pub fn declining() -> Self {
        Self { accept: false, ..Self::accepting(Vec::new()) }
    }

    pub fn failing_retrieve() -> Self {
        Self { fail_retrieve: true, ..Self::accepting(Vec::new()) }
    }

    /// Launch requests seen so far.
    pub fn launches(&self) -> Rc<RefCell<Vec<AppData>>> {
        self.launches.clone()
    }
}

impl DiscoveryHandler for FakeHandler {
    fn launch(&mut self, app: &AppData) -> bool {
        self.launches.borrow_mut().push(app.clone());
        self.accept
    }

    fn retrieve(&mut self, deliver: RetrieveCallback) -> Result<(), HandlerError> {
        if self.fail_retrieve {
            return Err(HandlerError("enumeration failed".to_string()));
        }
        deliver(self.items.clone());
        Ok(())
    }
}

//! The external discovery handler and the script loader that provides it.
//!
//! The discovery handler knows how to launch and enumerate custom
//! applications. It is not part of the host and not part of the proxy: it
//! arrives at runtime by loading a script, which may complete, raise, or
//! stay silent forever.

use std::{cell::RefCell, fmt, rc::Rc};

use appshim_proto::{AppData, AppDescriptor};

use crate::{HandlerError, LoadError};

/// Receives the handler once its script has loaded.
pub type LoadCallback = Box<dyn FnOnce(Box<dyn DiscoveryHandler>)>;

/// Receives the applications a handler enumerated.
pub type RetrieveCallback = Box<dyn FnOnce(Vec<AppDescriptor>)>;

/// Launches and enumerates custom applications.
pub trait DiscoveryHandler {
    /// Launch the application behind `app`. Returns whether the handler took
    /// over the launch.
    fn launch(&mut self, app: &AppData) -> bool;

    /// Enumerate applications, delivering them through `deliver` now or
    /// later.
    fn retrieve(&mut self, deliver: RetrieveCallback) -> Result<(), HandlerError>;
}

/// Loads external scripts.
pub trait ScriptLoader {
    /// Start loading `path`.
    ///
    /// `on_loaded` runs once the handler is available. It may never run: a
    /// silent script is indistinguishable from a slow one, so callers must
    /// enforce their own timeout. An `Err` means loading raised.
    fn load_external(&mut self, path: &str, on_loaded: LoadCallback) -> Result<(), LoadError>;
}

/// Shared slot holding the discovery handler once it has loaded.
///
/// The router consults the slot on every custom application selection and
/// the proxy fills it when loading succeeds. Both run on the same execution
/// context, so the slot is a plain `Rc<RefCell<_>>`. A slot that is already
/// borrowed (a handler calling back into the host while launching) reads as
/// busy rather than panicking.
#[derive(Clone, Default)]
pub struct HandlerSlot {
    inner: Rc<RefCell<Option<Box<dyn DiscoveryHandler>>>>,
}

impl HandlerSlot {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a handler is present.
    pub fn is_loaded(&self) -> bool {
        // A mutable borrow is only ever taken to call into a present handler.
        self.inner.try_borrow().map_or(true, |handler| handler.is_some())
    }

    /// Put `handler` into the slot, replacing any previous one.
    pub fn install(&self, handler: Box<dyn DiscoveryHandler>) {
        if let Ok(mut slot) = self.inner.try_borrow_mut() {
            *slot = Some(handler);
        }
    }

    /// Ask the handler to launch `app`. `false` when no handler is present
    /// or it declines.
    pub fn launch(&self, app: &AppData) -> bool {
        let Ok(mut slot) = self.inner.try_borrow_mut() else {
            return false;
        };
        slot.as_mut().is_some_and(|handler| handler.launch(app))
    }

    /// Ask the handler to enumerate applications. `Ok(false)` when no
    /// handler is present.
    pub fn retrieve(&self, deliver: RetrieveCallback) -> Result<bool, HandlerError> {
        let Ok(mut slot) = self.inner.try_borrow_mut() else {
            return Err(HandlerError("discovery handler is busy".to_string()));
        };
        match slot.as_mut() {
            Some(handler) => handler.retrieve(deliver).map(|()| true),
            None => Ok(false),
        }
    }
}

impl fmt::Debug for HandlerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSlot").field("loaded", &self.is_loaded()).finish()
    }
}

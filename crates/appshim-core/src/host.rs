//! Capability interface the host framework must expose.
//!
//! The host owns its entry points, its application registry, and its lookup
//! tables. The proxy never reaches into host internals: everything it needs
//! is expressed as a method on [`Host`], including the one operation that
//! replaces host behavior, [`Host::register_override`].

use std::fmt;

use appshim_proto::{AppDescriptor, Dispatch, RoutedMessage, SelectionEvent, StatusMessage};

use crate::HostError;

/// Host entry points the proxy intercepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryPoint {
    /// Selection callback of the system application's list control.
    ListSelect,
    /// USB-audio status message handler of the system application.
    UsbAudioStatus,
    /// Low-level routing of messages arriving from the transport.
    RouteMessage,
    /// Sending of events to the transport.
    SendEvent,
}

impl EntryPoint {
    /// Every intercepted entry point, in installation order.
    pub const ALL: [Self; 4] =
        [Self::ListSelect, Self::UsbAudioStatus, Self::RouteMessage, Self::SendEvent];

    /// Stable name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::ListSelect => "list_select",
            Self::UsbAudioStatus => "usb_audio_status",
            Self::RouteMessage => "route_message",
            Self::SendEvent => "send_event",
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Arguments of one call through an entry point.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    /// A list item was selected.
    ListSelect(SelectionEvent),
    /// A USB-audio status message arrived.
    UsbAudioStatus(StatusMessage),
    /// A message arrived from the transport.
    RouteMessage(RoutedMessage),
    /// An event is about to be sent to the transport.
    SendEvent(Dispatch),
}

impl HostCall {
    /// The entry point this call belongs to.
    pub fn entry_point(&self) -> EntryPoint {
        match self {
            Self::ListSelect(_) => EntryPoint::ListSelect,
            Self::UsbAudioStatus(_) => EntryPoint::UsbAudioStatus,
            Self::RouteMessage(_) => EntryPoint::RouteMessage,
            Self::SendEvent(_) => EntryPoint::SendEvent,
        }
    }
}

/// Implementation behind an entry point.
pub type Handler = Box<dyn FnMut(HostCall)>;

/// The host framework, as seen by the proxy.
pub trait Host {
    /// Currently active application, or `None` while the framework is not
    /// up yet.
    fn active_app(&self) -> Option<&str>;

    /// Whether a live instance of `app_id` exists.
    fn has_app_instance(&self, app_id: &str) -> bool;

    /// Replace the implementation behind `point`.
    ///
    /// The host takes its current implementation out of the slot, passes it
    /// to `wrap`, and installs whatever `wrap` returns. The original stays
    /// reachable only through the wrapper.
    fn register_override<F>(&mut self, point: EntryPoint, wrap: F) -> Result<(), HostError>
    where
        F: FnOnce(Handler) -> Handler;

    /// Map a UI template to a template category.
    fn set_template_category(&mut self, template: &str, category: &str);

    /// Append an application to the registry behind the system menu.
    fn append_application(&mut self, descriptor: AppDescriptor);

    /// Insert a title into the localization dictionary of `app_id`.
    fn insert_localized_title(&mut self, app_id: &str, key: String, title: String);

    /// Register the context category of every context matching `pattern`.
    fn insert_context_category(&mut self, pattern: String, category: String);
}

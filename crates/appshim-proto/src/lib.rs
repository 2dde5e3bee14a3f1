//! Messages exchanged across the host framework boundary.
//!
//! The host framework talks to its transport layer with loosely structured,
//! self-describing maps. This crate gives those maps a closed shape: every
//! message the proxy inspects is one of a handful of typed variants, and
//! everything else is carried as an opaque, untouched blob.
//!
//! Unknown fields on known shapes are preserved in a [`Fields`] map so a
//! rewritten message still carries everything the host put into it.
//!
//! # Components
//!
//! - [`identity`]: Application/context identity tuple
//! - [`message`]: Routed messages from the host transport
//! - [`selection`]: List-selection events from the host menu
//! - [`event`]: Outbound transport events and status messages
//! - [`descriptor`]: Application descriptors produced by discovery
//! - [`codec`]: CBOR encoding of routed messages
#![forbid(unsafe_code)]

pub mod codec;
pub mod descriptor;
pub mod errors;
pub mod event;
pub mod identity;
pub mod message;
pub mod selection;

use std::collections::BTreeMap;

pub use descriptor::AppDescriptor;
pub use errors::{ProtocolError, Result};
pub use event::{Dispatch, OutboundEvent, StatusMessage};
pub use identity::Identity;
pub use message::{
    ContextChange, FocusEntry, FocusStack, GenericKind, GenericMessage, OpaqueMessage,
    RoutedMessage,
};
pub use selection::{AppData, SelectionEvent};

/// Fields the proxy does not interpret, keyed by their host field name.
pub type Fields = BTreeMap<String, ciborium::Value>;

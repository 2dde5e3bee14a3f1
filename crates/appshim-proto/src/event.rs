//! Outbound events and status messages.

use crate::{Fields, Identity};

/// An event application logic asks the host to send to its transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEvent {
    /// Application the event is addressed to.
    pub uia_id: String,
    /// Event name.
    pub event_id: String,
    /// Event parameters.
    pub params: Fields,
    /// Whether the event was raised by voice input.
    pub from_vui: bool,
}

impl OutboundEvent {
    /// Event with no parameters, not voice-initiated.
    pub fn new(uia_id: impl Into<String>, event_id: impl Into<String>) -> Self {
        Self {
            uia_id: uia_id.into(),
            event_id: event_id.into(),
            params: Fields::new(),
            from_vui: false,
        }
    }
}

/// An outbound event together with the identity the transport attributes it
/// to.
///
/// The host stamps `origin` with its currently active application and
/// context before the send function runs. The transport only ever sees the
/// origin as stamped at the time of the call.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// The event.
    pub event: OutboundEvent,
    /// Active application and context at send time.
    pub origin: Identity,
}

/// A USB-audio status message delivered to the system application.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusMessage {
    /// Message fields, uninterpreted.
    pub fields: Fields,
}

//! Identity rewriting for every intercepted call.
//!
//! The router is a bidirectional identity translation over the four call
//! shapes the host exchanges with its transport:
//!
//! ```text
//!                    host menu
//!                        │ ListSelect (launch event)        target → proxy
//!                        ▼
//!   custom app ──── SendEvent ────────────────────────▶ transport
//!       ▲          origin target → proxy
//!       │
//!       └──────── RouteMessage ◀──────────────────────── transport
//!                  ctxtChg / focusStack / msg / alert   proxy → target
//! ```
//!
//! Translation only fires on an exact identity match and only substitutes
//! values: no message is created or dropped, and every call is handed to the
//! host's own handler afterwards. Nothing is remembered between calls;
//! the outbound direction depends only on the origin the host stamped on the
//! dispatch.

use std::rc::Rc;

use appshim_proto::{Dispatch, Identity, RoutedMessage, SelectionEvent, StatusMessage};
use tracing::debug;

use crate::{Handler, HandlerSlot, HostCall, IdentityTable};

/// Rewrites identities and delegates to the original entry points.
#[derive(Debug, Clone)]
pub struct Router {
    identities: Rc<IdentityTable>,
    handler: HandlerSlot,
}

impl Router {
    /// Router translating between the identities in `identities`, launching
    /// through whatever handler `handler` holds at call time.
    pub fn new(identities: Rc<IdentityTable>, handler: HandlerSlot) -> Self {
        Self { identities, handler }
    }

    /// Wrap `original` so every call is translated before reaching it.
    pub fn wrap(&self, mut original: Handler) -> Handler {
        let router = self.clone();
        Box::new(move |call| original(router.intercept(call)))
    }

    /// Translate one call.
    pub fn intercept(&self, call: HostCall) -> HostCall {
        match call {
            HostCall::ListSelect(event) => HostCall::ListSelect(self.select(event)),
            HostCall::UsbAudioStatus(msg) => HostCall::UsbAudioStatus(self.usb_audio(msg)),
            HostCall::RouteMessage(msg) => HostCall::RouteMessage(self.inbound(msg)),
            HostCall::SendEvent(dispatch) => HostCall::SendEvent(self.outbound(dispatch)),
        }
    }

    /// Disguise a custom application selection as a selection of the proxy
    /// application.
    ///
    /// Only applies when the selection carries the launch event and the
    /// discovery handler accepts the launch. The handler sees the selection
    /// as the user made it.
    pub fn select(&self, mut event: SelectionEvent) -> SelectionEvent {
        if event.app_data.mmui_event != self.identities.launch_event {
            return event;
        }

        if !self.handler.launch(&event.app_data) {
            debug!(app = %event.app_data.app_name, "launch declined, selection passes through");
            return event;
        }

        let proxy = &self.identities.proxy;
        debug!(app = %event.app_data.app_name, proxy = %proxy.app_id, "selection disguised");

        event.app_data.app_name.clone_from(&proxy.app_id);
        if let Some(proxy_event) = &proxy.event_id {
            event.app_data.mmui_event.clone_from(proxy_event);
        }
        event
    }

    /// Status messages are observed, never rewritten.
    pub fn usb_audio(&self, msg: StatusMessage) -> StatusMessage {
        msg
    }

    /// Attribute traffic of the target application to the proxy identity
    /// before it reaches the transport.
    pub fn outbound(&self, mut dispatch: Dispatch) -> Dispatch {
        let IdentityTable { proxy, target, .. } = self.identities.as_ref();
        if !dispatch.origin.is_app(&target.app_id) {
            return dispatch;
        }

        debug!(
            event = %dispatch.event.event_id,
            "outbound origin {} -> {}",
            target.app_id,
            proxy.app_id
        );
        dispatch.origin = Identity {
            app_id: proxy.app_id.clone(),
            context_id: proxy.context_id.clone(),
            event_id: dispatch.origin.event_id.take(),
        };
        dispatch
    }

    /// Hand traffic the transport addressed to the proxy identity to the
    /// target application.
    pub fn inbound(&self, msg: RoutedMessage) -> RoutedMessage {
        let IdentityTable { proxy, target, .. } = self.identities.as_ref();

        match msg {
            RoutedMessage::ContextChange(mut change) => {
                if change.uia_id == proxy.app_id {
                    debug!("context change {} -> {}", proxy.app_id, target.app_id);
                    change.uia_id.clone_from(&target.app_id);
                    change.ctxt_id.clone_from(&target.context_id);
                }
                RoutedMessage::ContextChange(change)
            },
            RoutedMessage::FocusStack(mut stack) => {
                let mut rewritten = 0usize;
                for entry in &mut stack.app_id_list {
                    if entry.id == proxy.app_id {
                        entry.id.clone_from(&target.app_id);
                        rewritten += 1;
                    }
                }
                rewrite_addressee(&mut stack.uia_id, proxy, target);
                if rewritten > 0 {
                    let (from, to) = (&proxy.app_id, &target.app_id);
                    debug!(entries = rewritten, "focus stack {from} -> {to}");
                }
                RoutedMessage::FocusStack(stack)
            },
            RoutedMessage::Generic(mut generic) => {
                if rewrite_addressee(&mut generic.uia_id, proxy, target) {
                    let (from, to) = (&proxy.app_id, &target.app_id);
                    debug!(kind = generic.kind.tag(), "message {from} -> {to}");
                }
                RoutedMessage::Generic(generic)
            },
            other @ RoutedMessage::Other(_) => other,
        }
    }
}

fn rewrite_addressee(uia_id: &mut Option<String>, proxy: &Identity, target: &Identity) -> bool {
    match uia_id {
        Some(id) if *id == proxy.app_id => {
            id.clone_from(&target.app_id);
            true
        },
        _ => false,
    }
}

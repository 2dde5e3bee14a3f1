//! Application identity.

use serde::{Deserialize, Serialize};

/// An application/context pair, optionally qualified by the event that
/// transitions into it.
///
/// Identities are configuration: the proxy compares and substitutes them but
/// never creates new ones at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Application id (the host calls this `uiaId`).
    pub app_id: String,
    /// Context id within the application (`ctxtId`).
    pub context_id: String,
    /// Event that selects this identity from a menu, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

impl Identity {
    /// Create an identity without an event id.
    pub fn new(app_id: impl Into<String>, context_id: impl Into<String>) -> Self {
        Self { app_id: app_id.into(), context_id: context_id.into(), event_id: None }
    }

    /// Attach the menu event that selects this identity.
    #[must_use]
    pub fn with_event(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    /// Exact, case-sensitive application id match.
    pub fn is_app(&self, app_id: &str) -> bool {
        self.app_id == app_id
    }
}

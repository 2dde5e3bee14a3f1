//! Routed messages delivered by the host transport.
//!
//! The host's low-level routing function receives a map tagged by
//! `msgType`. Only three shapes carry application identities the proxy must
//! translate; every other tag is [`RoutedMessage::Other`] and is never
//! inspected.
//!
//! | `msgType`          | Variant                          |
//! |--------------------|----------------------------------|
//! | `ctxtChg`          | [`RoutedMessage::ContextChange`] |
//! | `focusStack`       | [`RoutedMessage::FocusStack`]    |
//! | `msg`, `alert`     | [`RoutedMessage::Generic`]       |
//! | anything else      | [`RoutedMessage::Other`]         |

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::Fields;

/// A message travelling from the host transport to application logic.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutedMessage {
    /// An application/context transition.
    ContextChange(ContextChange),
    /// The ordered stack of applications currently holding focus.
    FocusStack(FocusStack),
    /// A plain message or alert addressed to an application.
    Generic(GenericMessage),
    /// Any other tag. Passed through verbatim.
    Other(OpaqueMessage),
}

impl RoutedMessage {
    /// The host's `msgType` tag, if the message has one.
    pub fn msg_type(&self) -> Option<&str> {
        match self {
            Self::ContextChange(_) => Some(ContextChange::TAG),
            Self::FocusStack(_) => Some(FocusStack::TAG),
            Self::Generic(msg) => Some(msg.kind.tag()),
            Self::Other(opaque) => opaque.msg_type(),
        }
    }
}

/// `ctxtChg`: the host switched to `uia_id`/`ctxt_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextChange {
    /// Application being entered.
    pub uia_id: String,
    /// Context being entered.
    pub ctxt_id: String,
    /// Uninterpreted fields.
    #[serde(flatten)]
    pub extra: Fields,
}

impl ContextChange {
    /// Wire tag.
    pub const TAG: &'static str = "ctxtChg";

    /// Context change with no extra fields.
    pub fn new(uia_id: impl Into<String>, ctxt_id: impl Into<String>) -> Self {
        Self { uia_id: uia_id.into(), ctxt_id: ctxt_id.into(), extra: Fields::new() }
    }
}

/// One entry of a focus stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusEntry {
    /// Application id.
    pub id: String,
    /// Uninterpreted fields.
    #[serde(flatten)]
    pub extra: Fields,
}

impl FocusEntry {
    /// Entry with no extra fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), extra: Fields::new() }
    }
}

/// `focusStack`: applications in focus order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusStack {
    /// Focus order, topmost first.
    #[serde(default)]
    pub app_id_list: Vec<FocusEntry>,
    /// Addressed application, when the host includes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uia_id: Option<String>,
    /// Uninterpreted fields.
    #[serde(flatten)]
    pub extra: Fields,
}

impl FocusStack {
    /// Wire tag.
    pub const TAG: &'static str = "focusStack";

    /// Focus stack over the given application ids.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { app_id_list: ids.into_iter().map(FocusEntry::new).collect(), ..Self::default() }
    }

    /// Application ids in focus order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.app_id_list.iter().map(|entry| entry.id.as_str())
    }
}

/// Which generic tag a [`GenericMessage`] arrived under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenericKind {
    /// `msg`
    #[default]
    Msg,
    /// `alert`
    Alert,
}

impl GenericKind {
    /// Wire tag.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Msg => "msg",
            Self::Alert => "alert",
        }
    }

    /// Parse a wire tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "msg" => Some(Self::Msg),
            "alert" => Some(Self::Alert),
            _ => None,
        }
    }
}

/// `msg` or `alert` addressed to an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericMessage {
    /// Tag the message arrived under. Carried by `msgType` on the wire.
    #[serde(skip)]
    pub kind: GenericKind,
    /// Addressed application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uia_id: Option<String>,
    /// Uninterpreted fields.
    #[serde(flatten)]
    pub extra: Fields,
}

impl GenericMessage {
    /// Message of `kind` addressed to `uia_id`.
    pub fn new(kind: GenericKind, uia_id: impl Into<String>) -> Self {
        Self { kind, uia_id: Some(uia_id.into()), extra: Fields::new() }
    }
}

/// A message whose tag the proxy does not handle.
///
/// Keeps the exact bytes it was decoded from so re-encoding reproduces the
/// input byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueMessage {
    msg_type: Option<String>,
    raw: Bytes,
}

impl OpaqueMessage {
    /// Wrap raw bytes carrying `msg_type`.
    pub fn new(msg_type: Option<String>, raw: impl Into<Bytes>) -> Self {
        Self { msg_type, raw: raw.into() }
    }

    /// The tag, if any.
    pub fn msg_type(&self) -> Option<&str> {
        self.msg_type.as_deref()
    }

    /// The original encoding.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }
}

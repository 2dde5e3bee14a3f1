//! Protocol error types.

use thiserror::Error;

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding routed messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Input was not valid CBOR, or a known message shape was malformed.
    #[error("failed to decode message: {0}")]
    Decode(String),

    /// Message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(String),

    /// Top-level CBOR item was not a map.
    #[error("message is not a map")]
    NotAMap,
}

//! Error types.
//!
//! None of these reach the host. Host errors abort a bootstrap attempt (the
//! next attempt resumes idempotently); load and handler errors are absorbed
//! by the loader's retry policy.

use thiserror::Error;

use crate::EntryPoint;

/// The host could not provide a capability the proxy asked for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The host has no implementation installed for this entry point.
    #[error("entry point {0} is not available")]
    MissingEntryPoint(EntryPoint),

    /// A live application instance the operation depends on is gone.
    #[error("application instance {0} is not available")]
    MissingInstance(String),
}

/// Loading the discovery handler script raised instead of completing or
/// staying silent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load {path}: {reason}")]
pub struct LoadError {
    /// Script that failed to load.
    pub path: String,
    /// What went wrong.
    pub reason: String,
}

impl LoadError {
    /// Load error for `path`.
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { path: path.into(), reason: reason.into() }
    }
}

/// The discovery handler failed to enumerate applications.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("discovery handler failed: {0}")]
pub struct HandlerError(pub String);

//! Simulated script loader.

use std::collections::BTreeSet;

use appshim_core::{LoadCallback, LoadError, ScriptLoader};
use tracing::debug;

use crate::SimDiscoveryHandler;

/// Script loader with a scripted outcome per load.
///
/// Loads are numbered from 1. A load either raises, provides the handler
/// (synchronously, through the callback), or stays silent forever.
#[derive(Debug, Clone)]
pub struct SimScriptLoader {
    handler: Option<SimDiscoveryHandler>,
    available_from: Option<u32>,
    raise_on: BTreeSet<u32>,
    paths: Vec<String>,
}

impl SimScriptLoader {
    /// Loader whose script never calls back.
    pub fn never() -> Self {
        Self { handler: None, available_from: None, raise_on: BTreeSet::new(), paths: Vec::new() }
    }

    /// Loader providing `handler` from load `n` on. Earlier loads stay
    /// silent.
    pub fn available_on(n: u32, handler: SimDiscoveryHandler) -> Self {
        Self { handler: Some(handler), available_from: Some(n), ..Self::never() }
    }

    /// Make load `n` raise.
    #[must_use]
    pub fn raise_on(mut self, n: u32) -> Self {
        self.raise_on.insert(n);
        self
    }

    /// Make every load up to and including `n` raise.
    #[must_use]
    pub fn raise_until(mut self, n: u32) -> Self {
        self.raise_on.extend(1..=n);
        self
    }

    /// Loads started so far.
    pub fn loads(&self) -> u32 {
        self.paths.len() as u32
    }

    /// Paths of every load, in order.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }
}

impl ScriptLoader for SimScriptLoader {
    fn load_external(&mut self, path: &str, on_loaded: LoadCallback) -> Result<(), LoadError> {
        self.paths.push(path.to_string());
        let load = self.loads();

        if self.raise_on.contains(&load) {
            debug!(load, path, "script raised");
            return Err(LoadError::new(path, "script raised while loading"));
        }

        match (&self.handler, self.available_from) {
            (Some(handler), Some(from)) if load >= from => {
                debug!(load, path, "script loaded");
                on_loaded(Box::new(handler.clone()));
            },
            _ => debug!(load, path, "script silent"),
        }
        Ok(())
    }
}

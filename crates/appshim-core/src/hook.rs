//! Idempotent installation of entry-point overrides.

use std::collections::BTreeMap;

use tracing::debug;

use crate::{EntryPoint, Handler, Host, HostError};

/// Installation state of one entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookRecord {
    /// Entry point.
    pub point: EntryPoint,
    /// Whether the wrapper is in place.
    pub installed: bool,
}

/// Tracks which entry points carry a wrapper.
///
/// An entry point is wrapped at most once per installer. Installing it again
/// is a no-op, so the host's own handler is captured exactly once and
/// a wrapper never ends up wrapping another wrapper.
#[derive(Debug, Clone)]
pub struct HookInstaller {
    records: BTreeMap<EntryPoint, HookRecord>,
}

impl HookInstaller {
    /// Installer with every entry point unwrapped.
    pub fn new() -> Self {
        let records = EntryPoint::ALL
            .iter()
            .map(|&point| (point, HookRecord { point, installed: false }))
            .collect();
        Self { records }
    }

    /// Wrap `point` with the wrapper `factory` builds around the original.
    ///
    /// Returns `Ok(false)` without touching the host if `point` is already
    /// wrapped.
    pub fn install<H, F>(
        &mut self,
        host: &mut H,
        point: EntryPoint,
        factory: F,
    ) -> Result<bool, HostError>
    where
        H: Host,
        F: FnOnce(Handler) -> Handler,
    {
        if self.is_installed(point) {
            return Ok(false);
        }

        host.register_override(point, factory)?;
        self.records.insert(point, HookRecord { point, installed: true });

        debug!(entry_point = %point, "hook installed");
        Ok(true)
    }

    /// Whether `point` is wrapped.
    pub fn is_installed(&self, point: EntryPoint) -> bool {
        self.records.get(&point).is_some_and(|record| record.installed)
    }

    /// Whether every entry point is wrapped.
    pub fn all_installed(&self) -> bool {
        self.records.values().all(|record| record.installed)
    }

    /// Installation records, in entry-point order.
    pub fn records(&self) -> impl Iterator<Item = &HookRecord> {
        self.records.values()
    }
}

impl Default for HookInstaller {
    fn default() -> Self {
        Self::new()
    }
}

//! Appshim core logic
//!
//! Lets a dynamically discovered application ride on the identity of an
//! application the host framework already knows. The host only routes
//! messages for identities wired into its own tables, so the proxy installs
//! itself on four host entry points and translates identities in both
//! directions: the host only ever sees the borrowed `proxy` identity, and the
//! custom application only ever sees its own `target` identity.
//!
//! # Architecture
//!
//! Everything here is single-threaded and free of I/O. State transitions
//! take the current host handle as a parameter and return declarative
//! [`Action`]s (schedule a timer, load a script, retrieve applications)
//! instead of performing them. [`Runtime`] interprets those actions against
//! a timer queue, a [`ScriptLoader`], and an inbox of asynchronous
//! completions, so production drivers and deterministic tests run the same
//! code.
//!
//! # Components
//!
//! - [`identity`]: The fixed identities involved in translation
//! - [`host`]: Capability interface the host framework must expose
//! - [`hook`]: Idempotent installation of entry-point overrides
//! - [`router`]: Identity rewriting for every intercepted call
//! - [`loader`]: Bounded-retry discovery handler loading
//! - [`proxy`]: Bootstrap sequencing and the proxy context object
//! - [`runtime`]: Generic driver loop
//! - [`mod@env`]: Environment abstraction (time)

pub mod action;
pub mod config;
pub mod discovery;
pub mod env;
pub mod error;
pub mod hook;
pub mod host;
pub mod identity;
pub mod loader;
pub mod proxy;
pub mod router;
pub mod runtime;
pub mod timer;

#[cfg(test)]
mod testing;

pub use action::{Action, Timer};
pub use config::{ExceptionPolicy, ProxyConfig, Timing};
pub use discovery::{DiscoveryHandler, HandlerSlot, LoadCallback, RetrieveCallback, ScriptLoader};
pub use env::Environment;
pub use error::{HandlerError, HostError, LoadError};
pub use hook::{HookInstaller, HookRecord};
pub use host::{EntryPoint, Handler, Host, HostCall};
pub use identity::IdentityTable;
pub use loader::{LoadAttemptState, Loader, LoaderState};
pub use proxy::Proxy;
pub use router::Router;
pub use runtime::Runtime;
pub use timer::TimerQueue;

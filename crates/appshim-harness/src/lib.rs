//! Deterministic simulation harness for appshim testing.
//!
//! In-memory implementations of the host framework, the script loader, the
//! discovery handler and the environment. Everything runs on virtual time,
//! so a scenario that spans minutes of retries completes instantly and
//! replays identically.

#![forbid(unsafe_code)]

pub mod scenario;
pub mod sim_env;
pub mod sim_handler;
pub mod sim_host;
pub mod sim_loader;

pub use scenario::{Scenario, SimRuntime, World};
pub use sim_env::SimEnv;
pub use sim_handler::{SimDiscoveryHandler, sample_apps};
pub use sim_host::{HostLog, SimHost};
pub use sim_loader::SimScriptLoader;

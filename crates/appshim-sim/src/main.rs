//! Appshim simulator.
//!
//! Boots the proxy against an in-memory host framework, waits for the
//! discovery handler, then plays one launch and one message exchange
//! through the installed hooks and logs the identities each side observed.
//!
//! # Usage
//!
//! ```bash
//! # Handler available on the second load, host ready after 3 seconds
//! appshim-sim --handler-after 2 --host-ready 3
//!
//! # Script that never loads, without waiting minutes of wall-clock time
//! appshim-sim --virtual-time
//!
//! # More detail
//! RUST_LOG=debug appshim-sim --handler-after 1 --debug
//! ```

use std::{
    future::Future,
    process::ExitCode,
    time::{Duration, Instant},
};

use appshim_core::{Environment, ExceptionPolicy, IdentityTable, LoaderState, ProxyConfig, Runtime};
use appshim_harness::{SimDiscoveryHandler, SimEnv, SimHost, SimScriptLoader, sample_apps};
use appshim_proto::{
    ContextChange, GenericKind, GenericMessage, OutboundEvent, ProtocolError, RoutedMessage,
};
use clap::{Parser, ValueEnum};
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Appshim simulator
#[derive(Parser, Debug)]
#[command(name = "appshim-sim")]
#[command(about = "Run the appshim proxy against a simulated host framework")]
struct Cli {
    /// Shorten the settle delay before the first load attempt
    #[arg(long)]
    debug: bool,

    /// Load attempts before discovery is abandoned
    #[arg(long, default_value_t = 20)]
    max_attempts: u32,

    /// Load on which the discovery script becomes available (never if
    /// omitted)
    #[arg(long)]
    handler_after: Option<u32>,

    /// Seconds until the host's system application is up
    #[arg(long, default_value_t = 0)]
    host_ready: u64,

    /// Number of custom applications the handler lists
    #[arg(long, default_value_t = 3)]
    apps: usize,

    /// Accounting of loads that raise
    #[arg(long, value_enum, default_value_t = Policy::Count)]
    exception_policy: Policy,

    /// Make every load up to this one raise
    #[arg(long, default_value_t = 0)]
    raise_until: u32,

    /// Run on a virtual clock instead of wall-clock time
    #[arg(long)]
    virtual_time: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Policy {
    /// Raised loads use up an attempt
    Count,
    /// Raised loads are retried without limit
    Unbounded,
}

impl From<Policy> for ExceptionPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Count => Self::CountTowardsCap,
            Policy::Unbounded => Self::Unbounded,
        }
    }
}

impl Cli {
    fn config(&self) -> ProxyConfig {
        ProxyConfig {
            max_attempts: self.max_attempts,
            exception_policy: self.exception_policy.into(),
            debug: self.debug,
            ..Default::default()
        }
    }

    fn scripts(&self) -> SimScriptLoader {
        let scripts = match self.handler_after {
            Some(n) => {
                SimScriptLoader::available_on(n, SimDiscoveryHandler::new(sample_apps(self.apps)))
            },
            None => SimScriptLoader::never(),
        };
        scripts.raise_until(self.raise_until)
    }
}

#[derive(Debug, Error)]
enum SimError {
    #[error("wire message: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("runtime went idle before discovery settled")]
    Stalled,
}

/// Wall-clock environment.
struct SystemEnv;

impl Environment for SystemEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        tokio::time::sleep(duration)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    info!(?cli, "starting simulation");

    let result = if cli.virtual_time {
        simulate(&SimEnv::new(), &cli).await
    } else {
        simulate(&SystemEnv, &cli).await
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("simulation failed: {e}");
            ExitCode::FAILURE
        },
    }
}

async fn simulate<E: Environment>(env: &E, cli: &Cli) -> Result<(), SimError> {
    let mut host = SimHost::new();
    if cli.host_ready == 0 {
        host.boot();
    }
    let mut runtime = Runtime::new(cli.config(), host, cli.scripts(), env.now());

    if cli.host_ready > 0 {
        let ready_at = env.now() + Duration::from_secs(cli.host_ready);
        runtime.run_until(env, |_| env.now() >= ready_at).await;
        info!("host finished loading");
        runtime.host_mut().boot();
        runtime.host_loaded(env.now());
    }

    let settled = runtime
        .run_until(env, |rt| {
            matches!(rt.loader_state(), LoaderState::Available | LoaderState::Exhausted)
        })
        .await;
    if !settled {
        return Err(SimError::Stalled);
    }

    info!(
        state = ?runtime.loader_state(),
        loads = runtime.scripts().loads(),
        attempts = runtime.attempts(),
        registered = runtime.host().registry.len(),
        "discovery settled"
    );

    let Some(first) = runtime.host().registry.first().map(|d| d.app_name().to_string()) else {
        warn!("no custom applications registered, nothing to launch");
        return Ok(());
    };

    let identities = runtime.proxy().identities().clone();
    exchange(runtime.host_mut(), &identities, &first)
}

/// One launch and one round trip between the transport and the custom
/// application.
fn exchange(
    host: &mut SimHost,
    identities: &IdentityTable,
    app_name: &str,
) -> Result<(), SimError> {
    let IdentityTable { proxy, target, .. } = identities;
    host.select_registered(app_name);
    if let Some(selection) = host.log().selections.last() {
        info!(
            picked = app_name,
            host_saw = %selection.app_data.app_name,
            event = %selection.app_data.mmui_event,
            "launch"
        );
    }

    let enter = RoutedMessage::ContextChange(ContextChange::new(&proxy.app_id, &proxy.context_id));
    host.receive(&enter.encode()?)?;
    if let Some(active) = host.active() {
        info!(
            transport_sent = %proxy.app_id,
            app = %active.app_id,
            context = %active.context_id,
            "context change"
        );
    }

    host.send_event(OutboundEvent::new(&target.app_id, "SelectBack"));
    if let Some(dispatch) = host.log().sent.last() {
        info!(
            app_sent_as = %target.app_id,
            transport_saw = %dispatch.origin.app_id,
            "outbound event"
        );
    }

    let reply = RoutedMessage::Generic(GenericMessage::new(GenericKind::Msg, &proxy.app_id));
    host.receive(&reply.encode()?)?;
    if let Some(RoutedMessage::Generic(msg)) = host.log().routed.last() {
        info!(transport_sent = %proxy.app_id, app_received = ?msg.uia_id, "inbound message");
    }

    Ok(())
}

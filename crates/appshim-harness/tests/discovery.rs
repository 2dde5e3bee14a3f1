//! Discovery handler loading and application registration.
//!
//! Load attempts are bounded: a script that never calls back is tried
//! exactly `max_attempts` times, then abandoned for good.

use std::time::Duration;

use appshim_core::{ExceptionPolicy, LoaderState, ProxyConfig, Timer};
use appshim_harness::{Scenario, SimDiscoveryHandler, SimScriptLoader, sample_apps};

const HOUR: Duration = Duration::from_secs(3600);

#[test]
fn silent_script_is_attempted_exactly_twenty_times() {
    let mut world = Scenario::new().build();

    assert!(world.run_to_idle(HOUR));

    assert_eq!(world.scripts().loads(), 20);
    assert_eq!(world.runtime().attempts(), 20);
    assert_eq!(world.runtime().loader_state(), LoaderState::Exhausted);
    assert!(world.host().registry.is_empty());
}

#[test]
fn attempts_are_one_retry_interval_apart() {
    let mut world = Scenario::new().build();

    // First attempt after 20ms handover and 5s settle.
    world.run_for(Duration::from_millis(5020));
    assert_eq!(world.scripts().loads(), 1);

    world.run_for(Duration::from_secs(10));
    assert_eq!(world.scripts().loads(), 2);

    world.run_for(Duration::from_secs(10));
    assert_eq!(world.scripts().loads(), 3);
}

#[test]
fn exhaustion_is_permanent() {
    let mut world = Scenario::new().build();
    assert!(world.run_to_idle(HOUR));

    world.run_for(HOUR);

    assert_eq!(world.scripts().loads(), 20);
    assert_eq!(world.runtime().loader_state(), LoaderState::Exhausted);
}

#[test]
fn smaller_cap_is_honored() {
    let config = ProxyConfig { max_attempts: 3, ..Default::default() };
    let mut world = Scenario::new().config(config).build();

    assert!(world.run_to_idle(HOUR));
    assert_eq!(world.scripts().loads(), 3);
}

#[test]
fn zero_cap_gives_up_without_loading() {
    let config = ProxyConfig { max_attempts: 0, ..Default::default() };
    let mut world = Scenario::new().config(config).build();

    assert!(world.run_to_idle(HOUR));

    assert_eq!(world.scripts().loads(), 0);
    assert_eq!(world.runtime().loader_state(), LoaderState::Exhausted);
}

#[test]
fn late_availability_registers_applications() {
    let handler = SimDiscoveryHandler::new(sample_apps(3));
    let mut world = Scenario::new().scripts(SimScriptLoader::available_on(4, handler)).build();

    assert!(world.run_to_idle(HOUR));

    assert_eq!(world.scripts().loads(), 4);
    assert_eq!(world.runtime().attempts(), 3);
    assert_eq!(world.runtime().loader_state(), LoaderState::Available);

    let host = world.host();
    let names: Vec<_> = host.registry.iter().map(|d| d.app_name()).collect();
    assert_eq!(names, ["app.sample1", "app.sample2", "app.sample3"]);

    let dictionary = &host.dictionaries["system"];
    assert_eq!(dictionary.get("app_sample2").map(String::as_str), Some("Sample 2"));
    assert_eq!(host.categories.get("app.sample3.*").map(String::as_str), Some("Applications"));
}

#[test]
fn success_cancels_the_safety_timer() {
    let handler = SimDiscoveryHandler::new(sample_apps(1));
    let mut world = Scenario::new().scripts(SimScriptLoader::available_on(1, handler)).build();

    world.run_for(Duration::from_secs(6));

    assert_eq!(world.runtime().loader_state(), LoaderState::Available);
    assert!(!world.runtime().timers().is_pending(Timer::LoadTimeout));
    assert!(world.runtime().next_deadline().is_none());
}

#[test]
fn raised_loads_count_towards_the_cap_by_default() {
    let scripts = SimScriptLoader::never().raise_until(100);
    let mut world = Scenario::new().scripts(scripts).build();

    assert!(world.run_to_idle(HOUR));

    assert_eq!(world.scripts().loads(), 20);
    assert_eq!(world.runtime().loader_state(), LoaderState::Exhausted);
}

#[test]
fn unbounded_policy_keeps_retrying_raised_loads() {
    let config = ProxyConfig { exception_policy: ExceptionPolicy::Unbounded, ..Default::default() };
    let handler = SimDiscoveryHandler::new(sample_apps(1));
    let scripts = SimScriptLoader::available_on(1, handler).raise_until(30);
    let mut world = Scenario::new().config(config).scripts(scripts).build();

    assert!(world.run_to_idle(HOUR));

    assert_eq!(world.scripts().loads(), 31);
    assert_eq!(world.runtime().attempts(), 0);
    assert_eq!(world.runtime().loader_state(), LoaderState::Available);
    assert_eq!(world.host().registry.len(), 1);
}

#[test]
fn raised_load_recovers_on_the_next_attempt() {
    let handler = SimDiscoveryHandler::new(sample_apps(2));
    let scripts = SimScriptLoader::available_on(1, handler).raise_on(1);
    let mut world = Scenario::new().scripts(scripts).build();

    world.run_for(Duration::from_millis(5020));
    assert!(world.runtime().timers().is_pending(Timer::LoadRetry));

    world.run_for(Duration::from_secs(10));
    assert_eq!(world.scripts().loads(), 2);
    assert_eq!(world.host().registry.len(), 2);
}

#[test]
fn registration_skipped_when_system_instance_is_gone() {
    let handler = SimDiscoveryHandler::new(sample_apps(2));
    let mut world = Scenario::new().scripts(SimScriptLoader::available_on(2, handler)).build();

    world.run_for(Duration::from_secs(6));
    world.host_mut().kill_instance("system");
    assert!(world.run_to_idle(HOUR));

    assert_eq!(world.runtime().loader_state(), LoaderState::Available);
    assert!(world.host().registry.is_empty());
    assert!(world.host().dictionaries.is_empty());
}

#[test]
fn retrieval_failure_settles_discovery() {
    let handler = SimDiscoveryHandler::new(sample_apps(2)).failing_retrieve();
    let mut world = Scenario::new().scripts(SimScriptLoader::available_on(1, handler)).build();

    assert!(world.run_to_idle(HOUR));

    assert_eq!(world.scripts().loads(), 1);
    assert_eq!(world.runtime().loader_state(), LoaderState::Available);
    assert!(world.host().registry.is_empty());

    // Not retried: nothing is pending and no further load happens.
    assert!(world.runtime().next_deadline().is_none());
    world.run_for(HOUR);
    assert_eq!(world.scripts().loads(), 1);
}

#[test]
fn debug_mode_settles_faster() {
    let config = ProxyConfig { debug: true, ..Default::default() };
    let mut world = Scenario::new().config(config).build();

    world.run_for(Duration::from_millis(520));

    assert_eq!(world.scripts().loads(), 1);
}

#[test]
fn runtime_script_path_is_configurable() {
    let config = ProxyConfig {
        runtime_script: "opt/runtime.js".to_string(),
        max_attempts: 1,
        ..Default::default()
    };
    let mut world = Scenario::new().config(config).build();

    assert!(world.run_to_idle(HOUR));

    assert_eq!(world.scripts().paths(), ["opt/runtime.js".to_string()]);
}

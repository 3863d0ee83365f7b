//! Client-side error telemetry core: a simulated host with patchable entry
//! points, interceptors that publish instrumentation events, a breadcrumb
//! engine that coalesces them into a bounded trail, and a capture pipeline
//! with mechanism tagging and duplicate-event filtering.

pub mod breadcrumbs;
pub mod client;
pub mod config;
pub mod dedupe;
pub mod host;
pub mod instrument;
pub mod scope;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::info;

pub use breadcrumbs::record::{Breadcrumb, Category, CrumbKind, Hint};
pub use client::{CapturedEvent, Client, ExceptionValue, Transport};
pub use config::SdkConfig;
pub use dedupe::DedupeFilter;
pub use host::{Host, HostBuilder};
pub use instrument::{Dispatcher, EventName, InstrumentationEvent, MechanismDescriptor};
pub use scope::Scope;

/// Wire scope, breadcrumb engine, dispatcher and capture client together and
/// install the configured interceptors on `host`.
pub fn init(host: &Host, config: &SdkConfig, transport: Rc<dyn Transport>) -> Rc<Client> {
    let wheel = host.wheel().clone();
    let scope = Rc::new(RefCell::new(Scope::new(config.max_breadcrumbs)));
    let engine = breadcrumbs::engine::BreadcrumbEngine::new(scope.clone(), wheel.clone(), config.debounce_ms);
    let dispatcher = Rc::new(Dispatcher::new());
    breadcrumbs::engine::BreadcrumbEngine::attach(&engine, &dispatcher);
    let client = Rc::new(Client::new(
        scope,
        engine,
        dispatcher.clone(),
        transport,
        wheel,
        config.dedupe,
    ));
    let registry = Rc::new(RefCell::new(instrument::CallbackRegistry::new()));
    instrument::install(host, &client, &dispatcher, &registry, config);
    info!(
        dom = config.instrument_dom,
        xhr = config.instrument_xhr,
        fetch = config.instrument_fetch,
        timers = config.instrument_timers,
        history = config.instrument_history,
        "instrumentation installed"
    );
    client
}

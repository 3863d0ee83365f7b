//! Interceptor layer.
//!
//! Each submodule patches one host surface and translates raw host activity
//! into named [`dispatcher`] events. Installation is capability-tolerant: an
//! absent surface logs and skips, the remaining interceptors still install.

pub mod dispatcher;
pub mod dom;
pub mod fetch;
pub mod history;
pub mod mechanism;
pub mod patch;
pub mod registry;
pub mod timers;
pub mod xhr;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;

use crate::client::Client;
use crate::config::SdkConfig;
use crate::host::Host;

pub use dispatcher::{Dispatcher, EventName, EventPayload, HandlerId, InstrumentationEvent};
pub use mechanism::{MechanismData, MechanismDescriptor};
pub use patch::{PatchError, Slot};
pub use registry::CallbackRegistry;

/// Install every interceptor the configuration asks for. A surface the host
/// does not expose is skipped with a warning; it never aborts the rest.
pub fn install(
    host: &Host,
    client: &Rc<Client>,
    dispatcher: &Rc<Dispatcher>,
    registry: &Rc<RefCell<CallbackRegistry>>,
    config: &SdkConfig,
) {
    let wheel = host.wheel();
    if config.instrument_dom {
        note_skip("dom", dom::install(host, client, dispatcher, registry, wheel));
    }
    if config.instrument_xhr {
        note_skip(
            "xhr",
            xhr::install(host, client, dispatcher, wheel, config.report_endpoint.clone()),
        );
    }
    if config.instrument_fetch {
        note_skip(
            "fetch",
            fetch::install(host, dispatcher, wheel, config.report_endpoint.clone()),
        );
    }
    if config.instrument_timers {
        note_skip("timers", timers::install(host, client, dispatcher, wheel));
    }
    if config.instrument_history {
        note_skip("history", history::install(host, dispatcher, wheel));
    }
}

/// Restore every patched entry point to its pre-install callable. Safe to
/// call on a host that was never (or only partially) instrumented.
pub fn uninstall(host: &Host) {
    let dom = host.dom_api();
    dom.add_event_listener.unpatch();
    dom.remove_event_listener.unpatch();

    let xhr = host.xhr_api();
    xhr.open.unpatch();
    xhr.send.unpatch();
    xhr.on_ready_state_change.unpatch();

    host.fetch_api().fetch.unpatch();

    let timers = host.timer_api();
    timers.set_timeout.unpatch();
    timers.set_interval.unpatch();
    timers.request_animation_frame.unpatch();

    let history = host.history_api();
    history.push_state.unpatch();
    history.replace_state.unpatch();
}

fn note_skip(interceptor: &'static str, result: Result<(), PatchError>) {
    if let Err(err) = result {
        warn!(interceptor, %err, "interceptor skipped");
    }
}

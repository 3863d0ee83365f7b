use std::cell::Cell;
use std::rc::Rc;

use crate::client::Client;
use crate::host::callback::Callback;
use crate::host::clock::TimerWheel;
use crate::host::xhr::{XhrRequest, XHR_DONE};
use crate::host::Host;

use super::dispatcher::{Dispatcher, EventName, EventPayload, InstrumentationEvent};
use super::mechanism::invoke_guarded;
use super::patch::PatchError;

/// XHR lifecycle interceptor.
///
/// `open` publishes method+url, `send` installs an internal readystate
/// monitor so the terminal-state breadcrumb exists with or without a user
/// handler, and a user `onreadystatechange` handler gets the mechanism
/// boundary plus a single-fire-per-state guard.
pub(crate) fn install(
    host: &Host,
    client: &Rc<Client>,
    dispatcher: &Rc<Dispatcher>,
    wheel: &TimerWheel,
    report_endpoint: Option<String>,
) -> Result<(), PatchError> {
    let api = host.xhr_api();
    {
        let dispatcher = dispatcher.clone();
        let wheel = wheel.clone();
        let report_endpoint = report_endpoint.clone();
        api.open.patch(move |original| {
            Rc::new(move |xhr, method, url| {
                original(xhr, method, url);
                if is_report_request(&report_endpoint, &xhr.url()) {
                    return;
                }
                dispatcher.publish(InstrumentationEvent {
                    name: EventName::XhrOpen,
                    target: None,
                    payload: EventPayload::XhrOpen {
                        method: xhr.method(),
                        url: xhr.url(),
                    },
                    timestamp: wheel.now(),
                });
            })
        })?;
    }
    {
        let dispatcher = dispatcher.clone();
        let wheel = wheel.clone();
        let report_endpoint = report_endpoint.clone();
        api.send.patch(move |original| {
            Rc::new(move |xhr, body| {
                original(xhr, body);
                if is_report_request(&report_endpoint, &xhr.url()) {
                    return;
                }
                xhr.set_monitor(state_monitor(dispatcher.clone(), wheel.clone()));
            })
        })?;
    }
    {
        let client = client.clone();
        api.on_ready_state_change.patch(move |original| {
            Rc::new(move |xhr, callback| {
                original(xhr, &state_change_wrapper(client.clone(), callback.clone()));
            })
        })?;
    }
    Ok(())
}

/// SDK-side observer: exactly one breadcrumb event per terminal state
/// transition, whatever the host's delivery behavior.
fn state_monitor(dispatcher: Rc<Dispatcher>, wheel: TimerWheel) -> Callback {
    let delivered = Cell::new(Option::<u8>::None);
    Callback::new(move |invocation| {
        let Some(xhr) = invocation.context.as_ref().and_then(|cx| cx.downcast_ref::<XhrRequest>())
        else {
            return Ok(());
        };
        let state = xhr.ready_state();
        if delivered.get() == Some(state) {
            return Ok(());
        }
        delivered.set(Some(state));
        if state == XHR_DONE {
            dispatcher.publish(InstrumentationEvent {
                name: EventName::XhrStateChange,
                target: None,
                payload: EventPayload::XhrStateChange {
                    method: xhr.method(),
                    url: xhr.url(),
                    status_code: xhr.status(),
                    body: xhr.body(),
                },
                timestamp: wheel.now(),
            });
        }
        Ok(())
    })
}

fn state_change_wrapper(client: Rc<Client>, original: Callback) -> Callback {
    let delivered = Cell::new(Option::<u8>::None);
    Callback::new(move |invocation| {
        if let Some(xhr) = invocation.context.as_ref().and_then(|cx| cx.downcast_ref::<XhrRequest>()) {
            let state = xhr.ready_state();
            // The host may redeliver a state; the user handler must not see it twice.
            if delivered.get() == Some(state) {
                return Ok(());
            }
            delivered.set(Some(state));
        }
        invoke_guarded(
            &client,
            "onreadystatechange",
            Some("XMLHttpRequest".to_string()),
            &original,
            invocation,
        )
    })
}

pub(super) fn is_report_request(report_endpoint: &Option<String>, url: &str) -> bool {
    matches!(report_endpoint, Some(endpoint) if url.contains(endpoint.as_str()))
}

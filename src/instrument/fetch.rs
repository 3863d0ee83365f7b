use std::rc::Rc;

use crate::host::clock::TimerWheel;
use crate::host::fetch::{FetchArg, FetchInit, FetchOutcome};
use crate::host::history::coerce_url;
use crate::host::Host;

use super::dispatcher::{Dispatcher, EventName, EventPayload, InstrumentationEvent};
use super::patch::PatchError;
use super::xhr::is_report_request;

/// Fetch interceptor. Publishes at call time and again on settlement of the
/// returned request, success or failure. Requests against the SDK's own
/// reporting endpoint never produce instrumentation events.
pub(crate) fn install(
    host: &Host,
    dispatcher: &Rc<Dispatcher>,
    wheel: &TimerWheel,
    report_endpoint: Option<String>,
) -> Result<(), PatchError> {
    let api = host.fetch_api();
    let dispatcher = dispatcher.clone();
    let wheel = wheel.clone();
    api.fetch.patch(move |original| {
        Rc::new(move |arg, init| {
            let handle = original(arg, init);
            let (method, url) = resolve_request(arg, init);
            if is_report_request(&report_endpoint, &url) {
                return handle;
            }
            dispatcher.publish(InstrumentationEvent {
                name: EventName::FetchStart,
                target: None,
                payload: EventPayload::FetchStart {
                    method: method.clone(),
                    url: url.clone(),
                },
                timestamp: wheel.now(),
            });
            let dispatcher = dispatcher.clone();
            let wheel = wheel.clone();
            handle.on_settle(move |outcome| {
                let (status_code, error) = match outcome {
                    FetchOutcome::Response { status } => (Some(*status), None),
                    FetchOutcome::Error { message } => (None, Some(message.clone())),
                };
                dispatcher.publish(InstrumentationEvent {
                    name: EventName::FetchEnd,
                    target: None,
                    payload: EventPayload::FetchEnd {
                        method,
                        url,
                        status_code,
                        error,
                    },
                    timestamp: wheel.now(),
                });
            });
            handle
        })
    })
}

/// Method and url from whatever the caller passed: a url string, a request
/// descriptor, or an arbitrary value coerced to its string form.
fn resolve_request(arg: &FetchArg, init: &FetchInit) -> (String, String) {
    let url = match arg {
        FetchArg::Url(url) => url.clone(),
        FetchArg::Request(request) => request.url.clone(),
        FetchArg::Other(value) => coerce_url(value),
    };
    let method = init
        .method
        .clone()
        .or_else(|| match arg {
            FetchArg::Request(request) => Some(request.method.clone()),
            _ => None,
        })
        .unwrap_or_else(|| "GET".to_string())
        .to_ascii_uppercase();
    (method, url)
}

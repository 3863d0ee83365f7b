//! Simulated host environment.
//!
//! Rust cannot rewrite someone else's globals, so the crate owns the call
//! sites outright: every built-in the SDK instruments (listener
//! registration, XHR lifecycle, fetch, timers, history) is a patchable
//! [`Slot`](crate::instrument::patch::Slot) on one of the surfaces below.
//! Application-style code drives the `Host` unmodified; the SDK observes by
//! patching, exactly where the original swapped browser built-ins.

pub mod callback;
pub mod clock;
pub mod dom;
pub mod fetch;
pub mod history;
pub mod target;
pub mod timers;
pub mod xhr;

use std::any::Any;
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

pub use callback::{
    Callback, CallbackId, CallbackResult, HandleEventReceiver, Invocation, Listener, Thrown,
};
pub use clock::{TimerHandle, TimerWheel, Timestamp};
pub use fetch::{FetchArg, FetchHandle, FetchInit, FetchOutcome, FetchRequest};
pub use target::{EventId, HostEvent, Target, TargetId};
pub use xhr::XhrRequest;

/// Capability descriptor: which host surfaces exist at all. Absent surfaces
/// make the corresponding interceptor a logged no-op at install time.
pub struct HostBuilder {
    dom: bool,
    timers: bool,
    xhr: bool,
    fetch: bool,
    history: bool,
    location: String,
}

impl HostBuilder {
    pub fn without_dom(mut self) -> Self {
        self.dom = false;
        self
    }

    pub fn without_timers(mut self) -> Self {
        self.timers = false;
        self
    }

    pub fn without_xhr(mut self) -> Self {
        self.xhr = false;
        self
    }

    pub fn without_fetch(mut self) -> Self {
        self.fetch = false;
        self
    }

    pub fn without_history(mut self) -> Self {
        self.history = false;
        self
    }

    pub fn location(mut self, location: &str) -> Self {
        self.location = location.to_string();
        self
    }

    pub fn build(self) -> Host {
        let wheel = TimerWheel::new();
        Host {
            dom: if self.dom { dom::DomApi::native() } else { dom::DomApi::absent() },
            timers: if self.timers {
                timers::TimerApi::native(&wheel)
            } else {
                timers::TimerApi::absent()
            },
            xhr: if self.xhr { xhr::XhrApi::native() } else { xhr::XhrApi::absent() },
            fetch: if self.fetch { fetch::FetchApi::native() } else { fetch::FetchApi::absent() },
            history: if self.history {
                history::HistoryApi::native(&self.location)
            } else {
                history::HistoryApi::absent(&self.location)
            },
            wheel,
        }
    }
}

pub struct Host {
    dom: dom::DomApi,
    timers: timers::TimerApi,
    xhr: xhr::XhrApi,
    fetch: fetch::FetchApi,
    history: history::HistoryApi,
    wheel: TimerWheel,
}

impl Host {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> HostBuilder {
        HostBuilder {
            dom: true,
            timers: true,
            xhr: true,
            fetch: true,
            history: true,
            location: "http://localhost/".to_string(),
        }
    }

    pub fn wheel(&self) -> &TimerWheel {
        &self.wheel
    }

    pub fn now(&self) -> Timestamp {
        self.wheel.now()
    }

    pub fn advance(&self, ms: u64) {
        self.wheel.advance(ms);
    }

    pub(crate) fn dom_api(&self) -> &dom::DomApi {
        &self.dom
    }

    pub(crate) fn timer_api(&self) -> &timers::TimerApi {
        &self.timers
    }

    pub(crate) fn xhr_api(&self) -> &xhr::XhrApi {
        &self.xhr
    }

    pub(crate) fn fetch_api(&self) -> &fetch::FetchApi {
        &self.fetch
    }

    pub(crate) fn history_api(&self) -> &history::HistoryApi {
        &self.history
    }

    // --- event targets -----------------------------------------------------

    pub fn add_event_listener(&self, target: &Target, event_type: &str, listener: &Listener) {
        if let Some(add) = self.dom.add_event_listener.get() {
            add(Some(target), event_type, listener);
        }
    }

    pub fn remove_event_listener(&self, target: &Target, event_type: &str, listener: &Listener) {
        if let Some(remove) = self.dom.remove_event_listener.get() {
            remove(Some(target), event_type, listener);
        }
    }

    /// Register a listener at the global scope: it sees every dispatched
    /// event of its type, after bubbling, with no receiver context.
    pub fn add_global_listener(&self, event_type: &str, listener: &Listener) {
        if let Some(add) = self.dom.add_event_listener.get() {
            add(None, event_type, listener);
        }
    }

    pub fn remove_global_listener(&self, event_type: &str, listener: &Listener) {
        if let Some(remove) = self.dom.remove_event_listener.get() {
            remove(None, event_type, listener);
        }
    }

    pub fn global_listener_count(&self) -> usize {
        self.dom.global_listener_count()
    }

    /// Dispatch an event at `target`, bubbling leaf to root. Listener errors
    /// never disturb delivery to the remaining listeners.
    pub fn dispatch_event(&self, target: &Target, event_type: &str) -> HostEvent {
        let event = HostEvent::new(event_type, Some(target.clone()));
        self.dispatch(event.clone());
        event
    }

    pub fn dispatch(&self, event: HostEvent) {
        let mut node = event.route_target().cloned();
        while let Some(current) = node {
            for listener in current.listeners_for(event.event_type()) {
                self.deliver(&listener, listener_context(&listener, Some(&current)), &event);
            }
            node = current.parent();
        }
        // Global listeners run last, with no receiver context.
        for listener in self.dom.global_listeners_for(event.event_type()) {
            self.deliver(&listener, listener_context(&listener, None), &event);
        }
    }

    fn deliver(&self, listener: &Listener, context: Option<Rc<dyn Any>>, event: &HostEvent) {
        let invocation = Invocation {
            context,
            event: Some(event.clone()),
        };
        if let Err(err) = listener.callback().invoke(&invocation) {
            debug!(%err, event_type = event.event_type(), "listener raised");
        }
    }

    // --- timers ------------------------------------------------------------

    pub fn set_timeout(
        &self,
        callback: &Callback,
        delay_ms: u64,
        context: Option<Rc<dyn Any>>,
    ) -> Option<TimerHandle> {
        self.timers.set_timeout.get().map(|f| f(callback, delay_ms, context))
    }

    pub fn set_interval(
        &self,
        callback: &Callback,
        every_ms: u64,
        context: Option<Rc<dyn Any>>,
    ) -> Option<TimerHandle> {
        self.timers.set_interval.get().map(|f| f(callback, every_ms, context))
    }

    pub fn request_animation_frame(
        &self,
        callback: &Callback,
        context: Option<Rc<dyn Any>>,
    ) -> Option<TimerHandle> {
        self.timers
            .request_animation_frame
            .get()
            .map(|f| f(callback, context))
    }

    pub fn clear_timer(&self, handle: TimerHandle) -> bool {
        self.wheel.cancel(handle)
    }

    // --- xhr ---------------------------------------------------------------

    pub fn new_xhr(&self) -> XhrRequest {
        XhrRequest::new()
    }

    pub fn xhr_open(&self, request: &XhrRequest, method: &str, url: &str) {
        if let Some(open) = self.xhr.open.get() {
            open(request, method, url);
        }
    }

    pub fn xhr_send(&self, request: &XhrRequest, body: Option<&str>) {
        if let Some(send) = self.xhr.send.get() {
            send(request, body);
        }
    }

    pub fn xhr_on_ready_state_change(&self, request: &XhrRequest, callback: &Callback) {
        if let Some(set) = self.xhr.on_ready_state_change.get() {
            set(request, callback);
        }
    }

    /// Deliver one readystate transition. The host is allowed to deliver the
    /// same state more than once; single-fire per state is the SDK's job.
    pub fn fire_xhr_ready_state(&self, request: &XhrRequest, ready_state: u8, status: u16) {
        request.set_state(ready_state, status);
        let invocation = Invocation::with_context(Rc::new(request.clone()));
        if let Some(monitor) = request.monitor() {
            let _ = monitor.invoke(&invocation);
        }
        if let Some(handler) = request.handler() {
            let _ = handler.invoke(&invocation);
        }
    }

    /// Walk a sent request through the intermediate states to DONE.
    pub fn complete_xhr(&self, request: &XhrRequest, status: u16) {
        for state in [2u8, 3, xhr::XHR_DONE] {
            self.fire_xhr_ready_state(request, state, status);
        }
    }

    // --- fetch -------------------------------------------------------------

    pub fn fetch(&self, arg: &FetchArg, init: &FetchInit) -> Option<FetchHandle> {
        self.fetch.fetch.get().map(|f| f(arg, init))
    }

    // --- history -----------------------------------------------------------

    pub fn push_state(&self, url: Option<&Value>) {
        if let Some(push) = self.history.push_state.get() {
            push(url);
        }
    }

    pub fn replace_state(&self, url: Option<&Value>) {
        if let Some(replace) = self.history.replace_state.get() {
            replace(url);
        }
    }

    pub fn location(&self) -> String {
        self.history.location()
    }
}

/// The receiver a listener observes: a `handleEvent`-style listener is
/// invoked on the listener object itself, a plain function on the node the
/// event is currently visiting, and a global-scope function on nothing.
fn listener_context(listener: &Listener, target: Option<&Target>) -> Option<Rc<dyn Any>> {
    match listener {
        Listener::HandleEvent { type_name, .. } => Some(Rc::new(HandleEventReceiver {
            type_name: type_name.clone(),
        }) as Rc<dyn Any>),
        Listener::Function(_) => target.map(|t| Rc::new(t.clone()) as Rc<dyn Any>),
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

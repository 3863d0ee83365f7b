use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::debug;

use crate::host::clock::{TimerHandle, TimerWheel};
use crate::host::target::{EventId, TargetId};
use crate::instrument::dispatcher::{Dispatcher, EventName, EventPayload, InstrumentationEvent};
use crate::scope::Scope;

use super::record::{Breadcrumb, Category, Hint, UNKNOWN_TARGET};

/// In-flight, not-yet-flushed input crumb. One slot: a keypress for a
/// different target flushes the old slot before claiming it.
struct PendingInput {
    target_id: Option<TargetId>,
    crumb: Breadcrumb,
    hint: Hint,
    timer: TimerHandle,
}

/// Converts raw instrumentation events into the deduplicated, ordered
/// breadcrumb trail.
///
/// Coalescing rules, per target identity:
/// - successive keypresses within the debounce window collapse into one
///   `ui.input` crumb; the timer resets on every repeat;
/// - a differing category or target flushes the pending input first, then
///   the new event is processed fresh;
/// - every capture through the pipeline forces a flush so mid-typing input
///   is not lost;
/// - an emission identical to the previous one (same ui category, same
///   target) is suppressed.
pub struct BreadcrumbEngine {
    scope: Rc<RefCell<Scope>>,
    wheel: TimerWheel,
    debounce_ms: u64,
    pending: Option<PendingInput>,
    last_fingerprint: Option<(Category, Option<TargetId>)>,
    last_dom_event: Option<EventId>,
    self_ref: Weak<RefCell<BreadcrumbEngine>>,
}

impl BreadcrumbEngine {
    pub fn new(scope: Rc<RefCell<Scope>>, wheel: TimerWheel, debounce_ms: u64) -> Rc<RefCell<Self>> {
        Rc::new_cyclic(|weak| {
            RefCell::new(Self {
                scope,
                wheel,
                debounce_ms,
                pending: None,
                last_fingerprint: None,
                last_dom_event: None,
                self_ref: weak.clone(),
            })
        })
    }

    /// Subscribe the engine to every breadcrumb-producing event name.
    pub fn attach(engine: &Rc<RefCell<Self>>, dispatcher: &Dispatcher) {
        for name in [
            EventName::Click,
            EventName::Keypress,
            EventName::XhrStateChange,
            EventName::FetchEnd,
            EventName::Navigation,
        ] {
            let engine = engine.clone();
            dispatcher.subscribe(name, Rc::new(move |event| engine.borrow_mut().handle(event)));
        }
    }

    pub fn handle(&mut self, event: &InstrumentationEvent) {
        match (&event.name, &event.payload) {
            (EventName::Click, EventPayload::Dom { event: host_event, global }) => {
                if self.seen_dom_event(host_event.id()) {
                    return;
                }
                let (message, target_id) = resolve_dom_target(host_event);
                self.flush_pending();
                let crumb = Breadcrumb::plain(Category::UiClick, &message, event.timestamp);
                let hint = dom_hint(host_event, *global);
                self.emit(crumb, hint, target_id);
            }
            (EventName::Keypress, EventPayload::Dom { event: host_event, global }) => {
                if self.seen_dom_event(host_event.id()) {
                    return;
                }
                let (message, target_id) = resolve_dom_target(host_event);
                self.on_keypress(message, target_id, dom_hint(host_event, *global), event);
            }
            (
                EventName::XhrStateChange,
                EventPayload::XhrStateChange {
                    method,
                    url,
                    status_code,
                    body,
                },
            ) => {
                self.flush_pending();
                let mut data = BTreeMap::new();
                data.insert("method".to_string(), Value::from(method.as_str()));
                data.insert("url".to_string(), Value::from(url.as_str()));
                data.insert("status_code".to_string(), Value::from(*status_code));
                let crumb = Breadcrumb::http(Category::Xhr, data, event.timestamp);
                let hint = Hint {
                    input: body.clone(),
                    ..Hint::default()
                };
                self.emit(crumb, hint, None);
            }
            (
                EventName::FetchEnd,
                EventPayload::FetchEnd {
                    method,
                    url,
                    status_code,
                    error,
                },
            ) => {
                self.flush_pending();
                let mut data = BTreeMap::new();
                data.insert("method".to_string(), Value::from(method.as_str()));
                data.insert("url".to_string(), Value::from(url.as_str()));
                if let Some(status) = status_code {
                    data.insert("status_code".to_string(), Value::from(*status));
                }
                if let Some(message) = error {
                    data.insert("error".to_string(), Value::from(message.as_str()));
                }
                let crumb = Breadcrumb::http(Category::Fetch, data, event.timestamp);
                self.emit(crumb, Hint::default(), None);
            }
            (EventName::Navigation, EventPayload::Navigation { from, to }) => {
                self.flush_pending();
                let mut data = BTreeMap::new();
                data.insert("from".to_string(), Value::from(from.as_str()));
                data.insert("to".to_string(), Value::from(to.as_str()));
                let crumb = Breadcrumb {
                    category: Category::Navigation,
                    kind: None,
                    message: None,
                    data,
                    timestamp: event.timestamp,
                };
                self.emit(crumb, Hint::default(), None);
            }
            _ => {}
        }
    }

    /// Finalize the pending input crumb, if any. Called by the debounce
    /// timer, by differing events, and by the capture pipeline before every
    /// emission.
    pub fn flush_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.wheel.cancel(pending.timer);
            self.emit(pending.crumb, pending.hint, pending.target_id);
        }
    }

    fn on_keypress(
        &mut self,
        message: String,
        target_id: Option<TargetId>,
        hint: Hint,
        event: &InstrumentationEvent,
    ) {
        let same_target = matches!(&self.pending, Some(p) if p.target_id == target_id);
        if same_target {
            // Coalesce: keep the first crumb, reset the timer.
            let timer = self.schedule_flush();
            if let Some(pending) = self.pending.as_mut() {
                let old = std::mem::replace(&mut pending.timer, timer);
                self.wheel.cancel(old);
            }
            return;
        }
        self.flush_pending();
        let crumb = Breadcrumb::plain(Category::UiInput, &message, event.timestamp);
        let timer = self.schedule_flush();
        self.pending = Some(PendingInput {
            target_id,
            crumb,
            hint,
            timer,
        });
    }

    fn schedule_flush(&self) -> TimerHandle {
        let weak = self.self_ref.clone();
        self.wheel.schedule(self.debounce_ms, move || {
            if let Some(engine) = weak.upgrade() {
                engine.borrow_mut().flush_pending();
            }
        })
    }

    /// One crumb per dispatched host event, however many listeners it
    /// bubbles through.
    fn seen_dom_event(&mut self, id: EventId) -> bool {
        if self.last_dom_event == Some(id) {
            return true;
        }
        self.last_dom_event = Some(id);
        false
    }

    fn emit(&mut self, crumb: Breadcrumb, hint: Hint, target_id: Option<TargetId>) {
        let fingerprint = (crumb.category, target_id);
        if crumb.category.is_ui() && self.last_fingerprint == Some(fingerprint) {
            debug!(category = %crumb.category, "identical breadcrumb suppressed");
            return;
        }
        self.last_fingerprint = Some(fingerprint);
        self.scope.borrow_mut().add_breadcrumb(crumb, hint);
    }
}

fn resolve_dom_target(event: &crate::host::target::HostEvent) -> (String, Option<TargetId>) {
    // Target access can throw; the crumb survives with a sentinel message.
    match event.target() {
        Ok(Some(target)) => (target.locator().to_string(), Some(target.id())),
        Ok(None) => (UNKNOWN_TARGET.to_string(), None),
        Err(_) => (UNKNOWN_TARGET.to_string(), None),
    }
}

fn dom_hint(event: &crate::host::target::HostEvent, global: bool) -> Hint {
    Hint {
        input: None,
        event: Some(event.clone()),
        name: Some(event.event_type().to_string()),
        global: Some(global),
    }
}

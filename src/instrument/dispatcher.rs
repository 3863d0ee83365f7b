use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::host::clock::Timestamp;
use crate::host::target::{HostEvent, Target};

/// Fixed set of instrumentation event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    Click,
    Keypress,
    XhrOpen,
    XhrStateChange,
    FetchStart,
    FetchEnd,
    Navigation,
    TimerFire,
}

#[derive(Debug, Clone)]
pub enum EventPayload {
    Dom {
        event: HostEvent,
        global: bool,
    },
    XhrOpen {
        method: String,
        url: String,
    },
    XhrStateChange {
        method: String,
        url: String,
        status_code: u16,
        body: Option<String>,
    },
    FetchStart {
        method: String,
        url: String,
    },
    FetchEnd {
        method: String,
        url: String,
        status_code: Option<u16>,
        error: Option<String>,
    },
    Navigation {
        from: String,
        to: String,
    },
    TimerFire {
        api: &'static str,
    },
}

/// Normalized observation produced by one interceptor, consumed by zero or
/// more subscribers. Transient, never persisted.
#[derive(Debug, Clone)]
pub struct InstrumentationEvent {
    pub name: EventName,
    pub target: Option<Target>,
    pub payload: EventPayload,
    pub timestamp: Timestamp,
}

pub type Handler = Rc<dyn Fn(&InstrumentationEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerId(u64);

/// Process-wide publish point. Interceptors publish, handler sets receive.
#[derive(Default)]
pub struct Dispatcher {
    handlers: RefCell<HashMap<EventName, Vec<(HandlerId, Handler)>>>,
    next_id: Cell<u64>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, name: EventName, handler: Handler) -> HandlerId {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.handlers
            .borrow_mut()
            .entry(name)
            .or_default()
            .push((id, handler));
        id
    }

    pub fn unsubscribe(&self, name: EventName, id: HandlerId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        match handlers.get_mut(&name) {
            Some(list) => {
                let before = list.len();
                list.retain(|(hid, _)| *hid != id);
                before != list.len()
            }
            None => false,
        }
    }

    pub fn publish(&self, event: InstrumentationEvent) {
        trace!(name = ?event.name, "instrumentation event");
        // Handlers may subscribe/unsubscribe re-entrantly; never hold the
        // borrow across their invocation.
        let handlers: Vec<Handler> = self
            .handlers
            .borrow()
            .get(&event.name)
            .map(|list| list.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();
        for handler in handlers {
            handler(&event);
        }
    }
}

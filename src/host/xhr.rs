use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::instrument::patch::Slot;

use super::callback::Callback;

pub const XHR_DONE: u8 = 4;

/// Simulated XHR-style request object. Lifecycle state lives here; `open`,
/// `send` and the state-change handler setter are patchable slots on the
/// surface below.
#[derive(Clone)]
pub struct XhrRequest {
    inner: Rc<XhrInner>,
}

struct XhrInner {
    method: RefCell<String>,
    url: RefCell<String>,
    body: RefCell<Option<String>>,
    ready_state: Cell<u8>,
    status: Cell<u16>,
    sent: Cell<bool>,
    handler: RefCell<Option<Callback>>,
    monitor: RefCell<Option<Callback>>,
}

impl XhrRequest {
    pub(crate) fn new() -> Self {
        Self {
            inner: Rc::new(XhrInner {
                method: RefCell::new(String::new()),
                url: RefCell::new(String::new()),
                body: RefCell::new(None),
                ready_state: Cell::new(0),
                status: Cell::new(0),
                sent: Cell::new(false),
                handler: RefCell::new(None),
                monitor: RefCell::new(None),
            }),
        }
    }

    pub fn method(&self) -> String {
        self.inner.method.borrow().clone()
    }

    pub fn url(&self) -> String {
        self.inner.url.borrow().clone()
    }

    pub fn body(&self) -> Option<String> {
        self.inner.body.borrow().clone()
    }

    pub fn ready_state(&self) -> u8 {
        self.inner.ready_state.get()
    }

    pub fn status(&self) -> u16 {
        self.inner.status.get()
    }

    pub fn sent(&self) -> bool {
        self.inner.sent.get()
    }

    pub(crate) fn begin(&self, method: &str, url: &str) {
        *self.inner.method.borrow_mut() = method.to_ascii_uppercase();
        *self.inner.url.borrow_mut() = url.to_string();
        self.inner.ready_state.set(1);
    }

    pub(crate) fn record_body(&self, body: Option<&str>) {
        *self.inner.body.borrow_mut() = body.map(str::to_string);
        self.inner.sent.set(true);
    }

    pub(crate) fn set_state(&self, ready_state: u8, status: u16) {
        self.inner.ready_state.set(ready_state);
        self.inner.status.set(status);
    }

    pub(crate) fn set_handler(&self, callback: Callback) {
        *self.inner.handler.borrow_mut() = Some(callback);
    }

    pub(crate) fn handler(&self) -> Option<Callback> {
        self.inner.handler.borrow().clone()
    }

    /// SDK-internal readystate observer, installed by the send wrapper so a
    /// terminal-state breadcrumb exists even with no user handler attached.
    pub(crate) fn set_monitor(&self, callback: Callback) {
        *self.inner.monitor.borrow_mut() = Some(callback);
    }

    pub(crate) fn monitor(&self) -> Option<Callback> {
        self.inner.monitor.borrow().clone()
    }
}

impl fmt::Debug for XhrRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XhrRequest")
            .field("method", &self.method())
            .field("url", &self.url())
            .field("ready_state", &self.ready_state())
            .field("status", &self.status())
            .finish()
    }
}

pub type XhrOpenFn = dyn Fn(&XhrRequest, &str, &str);
pub type XhrSendFn = dyn Fn(&XhrRequest, Option<&str>);
pub type XhrHandlerFn = dyn Fn(&XhrRequest, &Callback);

pub struct XhrApi {
    pub open: Slot<XhrOpenFn>,
    pub send: Slot<XhrSendFn>,
    pub on_ready_state_change: Slot<XhrHandlerFn>,
}

impl XhrApi {
    pub(crate) fn native() -> Self {
        let open: Rc<XhrOpenFn> = Rc::new(|xhr, method, url| xhr.begin(method, url));
        let send: Rc<XhrSendFn> = Rc::new(|xhr, body| xhr.record_body(body));
        let handler: Rc<XhrHandlerFn> = Rc::new(|xhr, callback| xhr.set_handler(callback.clone()));
        Self {
            open: Slot::filled("open", open),
            send: Slot::filled("send", send),
            on_ready_state_change: Slot::filled("onreadystatechange", handler),
        }
    }

    pub(crate) fn absent() -> Self {
        Self {
            open: Slot::absent("open"),
            send: Slot::absent("send"),
            on_ready_state_change: Slot::absent("onreadystatechange"),
        }
    }
}

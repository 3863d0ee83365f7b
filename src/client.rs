use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use tracing::debug;

use crate::breadcrumbs::engine::BreadcrumbEngine;
use crate::breadcrumbs::record::Breadcrumb;
use crate::dedupe::DedupeFilter;
use crate::host::callback::Thrown;
use crate::host::clock::{TimerWheel, Timestamp};
use crate::instrument::dispatcher::Dispatcher;
use crate::instrument::mechanism::MechanismDescriptor;
use crate::scope::Scope;

#[derive(Debug, Clone, Serialize)]
pub struct ExceptionValue {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mechanism: Option<MechanismDescriptor>,
}

/// Event handed to the transport: a message or an exception, plus the
/// breadcrumb trail snapshot taken at capture time.
#[derive(Debug, Clone, Serialize)]
pub struct CapturedEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<ExceptionValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub breadcrumbs: Vec<Breadcrumb>,
    pub timestamp: Timestamp,
}

/// External submission boundary. Serialization and delivery live behind it.
pub trait Transport {
    fn send(&self, event: CapturedEvent);
}

/// Capture pipeline. Every capture forces the pending input crumb to flush
/// first, so an error fired mid-typing still carries the input breadcrumb.
pub struct Client {
    scope: Rc<RefCell<Scope>>,
    engine: Rc<RefCell<BreadcrumbEngine>>,
    dispatcher: Rc<Dispatcher>,
    dedupe: Option<RefCell<DedupeFilter>>,
    transport: Rc<dyn Transport>,
    wheel: TimerWheel,
}

impl Client {
    pub fn new(
        scope: Rc<RefCell<Scope>>,
        engine: Rc<RefCell<BreadcrumbEngine>>,
        dispatcher: Rc<Dispatcher>,
        transport: Rc<dyn Transport>,
        wheel: TimerWheel,
        dedupe: bool,
    ) -> Self {
        Self {
            scope,
            engine,
            dispatcher,
            dedupe: dedupe.then(|| RefCell::new(DedupeFilter::new())),
            transport,
            wheel,
        }
    }

    pub fn scope(&self) -> Rc<RefCell<Scope>> {
        self.scope.clone()
    }

    /// The instrumentation publish point, exposed so integrations can
    /// subscribe to raw instrumentation events by name.
    pub fn dispatcher(&self) -> &Rc<Dispatcher> {
        &self.dispatcher
    }

    pub fn capture_message(&self, message: &str) {
        self.submit(CapturedEvent {
            message: Some(message.to_string()),
            exception: None,
            fingerprint: None,
            breadcrumbs: Vec::new(),
            timestamp: self.wheel.now(),
        });
    }

    pub fn capture_error(&self, error: &Thrown, mechanism: Option<MechanismDescriptor>) {
        self.capture_error_with_fingerprint(error, mechanism, None);
    }

    pub fn capture_error_with_fingerprint(
        &self,
        error: &Thrown,
        mechanism: Option<MechanismDescriptor>,
        fingerprint: Option<Vec<String>>,
    ) {
        self.submit(CapturedEvent {
            message: None,
            exception: Some(ExceptionValue {
                kind: error.kind.clone(),
                value: error.message.clone(),
                mechanism,
            }),
            fingerprint,
            breadcrumbs: Vec::new(),
            timestamp: self.wheel.now(),
        });
    }

    fn submit(&self, mut event: CapturedEvent) {
        // Forced flush: in-flight input crumbs land before the snapshot.
        self.engine.borrow_mut().flush_pending();
        event.breadcrumbs = self.scope.borrow().breadcrumbs();
        if let Some(filter) = &self.dedupe {
            if filter.borrow_mut().should_drop(&event) {
                return;
            }
        }
        debug!(
            has_exception = event.exception.is_some(),
            breadcrumbs = event.breadcrumbs.len(),
            "captured event submitted"
        );
        self.transport.send(event);
    }
}

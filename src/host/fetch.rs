use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use uuid::Uuid;

use crate::instrument::patch::Slot;

/// First argument to the fetch entry point. Callers may pass a url string,
/// a request descriptor, or anything else; arbitrary values are coerced to
/// a string url rather than rejected.
#[derive(Debug, Clone)]
pub enum FetchArg {
    Url(String),
    Request(FetchRequest),
    Other(Value),
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: String,
    pub url: String,
}

#[derive(Debug, Clone, Default)]
pub struct FetchInit {
    pub method: Option<String>,
}

#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Response { status: u16 },
    Error { message: String },
}

/// Handle to an in-flight fetch. Settlement hooks run exactly once, at
/// settlement time or immediately if the request already settled.
#[derive(Clone)]
pub struct FetchHandle {
    inner: Rc<FetchState>,
}

struct FetchState {
    id: Uuid,
    settled: RefCell<Option<FetchOutcome>>,
    hooks: RefCell<Vec<Box<dyn FnOnce(&FetchOutcome)>>>,
}

impl FetchHandle {
    fn new() -> Self {
        Self {
            inner: Rc::new(FetchState {
                id: Uuid::new_v4(),
                settled: RefCell::new(None),
                hooks: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn on_settle(&self, hook: impl FnOnce(&FetchOutcome) + 'static) {
        let settled = self.inner.settled.borrow().clone();
        match settled {
            Some(outcome) => hook(&outcome),
            None => self.inner.hooks.borrow_mut().push(Box::new(hook)),
        }
    }

    pub fn settle(&self, outcome: FetchOutcome) {
        if self.inner.settled.borrow().is_some() {
            return;
        }
        *self.inner.settled.borrow_mut() = Some(outcome.clone());
        let hooks: Vec<_> = self.inner.hooks.borrow_mut().drain(..).collect();
        for hook in hooks {
            hook(&outcome);
        }
    }

    pub fn outcome(&self) -> Option<FetchOutcome> {
        self.inner.settled.borrow().clone()
    }
}

impl fmt::Debug for FetchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchHandle")
            .field("id", &self.inner.id)
            .field("settled", &self.inner.settled.borrow().is_some())
            .finish()
    }
}

pub type FetchFn = dyn Fn(&FetchArg, &FetchInit) -> FetchHandle;

pub struct FetchApi {
    pub fetch: Slot<FetchFn>,
}

impl FetchApi {
    pub(crate) fn native() -> Self {
        let fetch: Rc<FetchFn> = Rc::new(|_arg, _init| FetchHandle::new());
        Self {
            fetch: Slot::filled("fetch", fetch),
        }
    }

    pub(crate) fn absent() -> Self {
        Self {
            fetch: Slot::absent("fetch"),
        }
    }
}

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use uuid::Uuid;

/// Stable identity of a callable. Clones of a `Callback` share the same id,
/// which is what the registry keys on for wrapper lookup and listener removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(Uuid);

/// Simulated exception object raised by application callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thrown {
    pub kind: String,
    pub message: String,
}

impl Thrown {
    pub fn new(kind: &str, message: &str) -> Self {
        Self {
            kind: kind.to_string(),
            message: message.to_string(),
        }
    }

    pub fn error(message: &str) -> Self {
        Self::new("Error", message)
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Thrown {}

pub type CallbackResult = Result<(), Thrown>;

/// Call-site context forwarded to a callback. The receiver is captured
/// explicitly at the original call site and passed through every wrapper
/// layer untouched, so bound callbacks observe the same context as if
/// they were never wrapped.
#[derive(Clone, Default)]
pub struct Invocation {
    pub context: Option<Rc<dyn Any>>,
    pub event: Option<super::target::HostEvent>,
}

impl Invocation {
    pub fn with_context(context: Rc<dyn Any>) -> Self {
        Self {
            context: Some(context),
            event: None,
        }
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("has_context", &self.context.is_some())
            .field("event", &self.event)
            .finish()
    }
}

/// A host-registrable callable with identity and an optional declared name.
#[derive(Clone)]
pub struct Callback {
    inner: Rc<CallbackInner>,
}

struct CallbackInner {
    id: CallbackId,
    name: Option<String>,
    func: Box<dyn Fn(&Invocation) -> CallbackResult>,
}

impl Callback {
    pub fn new(func: impl Fn(&Invocation) -> CallbackResult + 'static) -> Self {
        Self {
            inner: Rc::new(CallbackInner {
                id: CallbackId(Uuid::new_v4()),
                name: None,
                func: Box::new(func),
            }),
        }
    }

    pub fn named(name: &str, func: impl Fn(&Invocation) -> CallbackResult + 'static) -> Self {
        Self {
            inner: Rc::new(CallbackInner {
                id: CallbackId(Uuid::new_v4()),
                name: Some(name.to_string()),
                func: Box::new(func),
            }),
        }
    }

    pub fn id(&self) -> CallbackId {
        self.inner.id
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    pub fn invoke(&self, invocation: &Invocation) -> CallbackResult {
        (self.inner.func)(invocation)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .finish()
    }
}

/// Listener registration styles accepted by the event-target surface.
/// The object style mirrors `handleEvent`-bearing listeners: the object
/// itself is opaque, only its invocation method is wrapped and tracked.
#[derive(Debug, Clone)]
pub enum Listener {
    Function(Callback),
    HandleEvent { type_name: String, callback: Callback },
}

impl Listener {
    pub fn callback(&self) -> &Callback {
        match self {
            Listener::Function(cb) => cb,
            Listener::HandleEvent { callback, .. } => callback,
        }
    }

    /// Same registration style, different callable. Wrappers use this so a
    /// wrapped registration keeps the shape the caller registered with.
    pub(crate) fn with_callback(&self, callback: Callback) -> Listener {
        match self {
            Listener::Function(_) => Listener::Function(callback),
            Listener::HandleEvent { type_name, .. } => Listener::HandleEvent {
                type_name: type_name.clone(),
                callback,
            },
        }
    }
}

/// Receiver stand-in for a `handleEvent`-style listener. The host invokes
/// the method with the listener object as its receiver, so dispatch passes
/// this in place of the event target.
#[derive(Debug, Clone)]
pub struct HandleEventReceiver {
    pub type_name: String,
}

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use uuid::Uuid;

use super::callback::{CallbackId, Listener, Thrown};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(Uuid);

/// An event-target node in the simulated host tree. Listener storage lives
/// here; registration goes through the patchable dom surface so the SDK can
/// observe it.
#[derive(Debug, Clone)]
pub struct Target {
    inner: Rc<TargetInner>,
}

#[derive(Debug)]
struct TargetInner {
    id: TargetId,
    type_name: String,
    locator: String,
    parent: Option<Target>,
    listeners: RefCell<HashMap<String, Vec<Listener>>>,
}

impl Target {
    pub fn new(type_name: &str, locator: &str) -> Self {
        Self::build(type_name, locator, None)
    }

    pub fn with_parent(type_name: &str, locator: &str, parent: &Target) -> Self {
        Self::build(type_name, locator, Some(parent.clone()))
    }

    fn build(type_name: &str, locator: &str, parent: Option<Target>) -> Self {
        Self {
            inner: Rc::new(TargetInner {
                id: TargetId(Uuid::new_v4()),
                type_name: type_name.to_string(),
                locator: locator.to_string(),
                parent,
                listeners: RefCell::new(HashMap::new()),
            }),
        }
    }

    pub fn id(&self) -> TargetId {
        self.inner.id
    }

    pub fn type_name(&self) -> &str {
        &self.inner.type_name
    }

    /// Human-readable locator used as the breadcrumb message, e.g.
    /// `body > form#foo-form > input[name="foo"]`.
    pub fn locator(&self) -> &str {
        &self.inner.locator
    }

    pub fn parent(&self) -> Option<Target> {
        self.inner.parent.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().values().map(Vec::len).sum()
    }

    pub(crate) fn push_listener(&self, event_type: &str, listener: Listener) {
        self.inner
            .listeners
            .borrow_mut()
            .entry(event_type.to_string())
            .or_default()
            .push(listener);
    }

    /// Remove one matching registration. A listener registered twice keeps
    /// its second entry until a second removal, mirroring the registration
    /// count kept on the wrapper side.
    pub(crate) fn drop_listener(&self, event_type: &str, id: CallbackId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        match listeners.get_mut(event_type) {
            Some(list) => match list.iter().position(|l| l.callback().id() == id) {
                Some(index) => {
                    list.remove(index);
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    pub(crate) fn listeners_for(&self, event_type: &str) -> Vec<Listener> {
        self.inner
            .listeners
            .borrow()
            .get(event_type)
            .cloned()
            .unwrap_or_default()
    }
}

impl PartialEq for Target {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Target {}

/// A dispatched host event. Target access is fallible: some host objects
/// raise when their target is read, and breadcrumb construction has to
/// survive that.
#[derive(Debug, Clone)]
pub struct HostEvent {
    inner: Rc<EventInner>,
}

#[derive(Debug)]
struct EventInner {
    id: EventId,
    event_type: String,
    target: Option<Target>,
    poisoned_target: bool,
}

impl HostEvent {
    pub fn new(event_type: &str, target: Option<Target>) -> Self {
        Self::build(event_type, target, false)
    }

    /// An event whose target accessor throws when read.
    pub fn with_poisoned_target(event_type: &str, target: Option<Target>) -> Self {
        Self::build(event_type, target, true)
    }

    fn build(event_type: &str, target: Option<Target>, poisoned_target: bool) -> Self {
        Self {
            inner: Rc::new(EventInner {
                id: EventId(Uuid::new_v4()),
                event_type: event_type.to_string(),
                target,
                poisoned_target,
            }),
        }
    }

    pub fn id(&self) -> EventId {
        self.inner.id
    }

    pub fn event_type(&self) -> &str {
        &self.inner.event_type
    }

    pub fn target(&self) -> Result<Option<&Target>, Thrown> {
        if self.inner.poisoned_target {
            return Err(Thrown::new("TypeError", "cannot read event target"));
        }
        Ok(self.inner.target.as_ref())
    }

    /// Internal routing target for dispatch. Poisoning only affects the
    /// public accessor, never event delivery itself.
    pub(crate) fn route_target(&self) -> Option<&Target> {
        self.inner.target.as_ref()
    }
}

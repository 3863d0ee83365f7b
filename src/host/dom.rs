use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::instrument::patch::Slot;

use super::callback::Listener;
use super::target::Target;

/// `None` as the target means the global scope.
pub type AddListenerFn = dyn Fn(Option<&Target>, &str, &Listener);
pub type RemoveListenerFn = dyn Fn(Option<&Target>, &str, &Listener);

/// Listener registration surface. The natives only touch the listener
/// tables (per-target, or the global one held here); everything the SDK
/// observes comes from patching these two slots.
pub struct DomApi {
    pub add_event_listener: Slot<AddListenerFn>,
    pub remove_event_listener: Slot<RemoveListenerFn>,
    global: Rc<RefCell<HashMap<String, Vec<Listener>>>>,
}

impl DomApi {
    pub(crate) fn native() -> Self {
        let global: Rc<RefCell<HashMap<String, Vec<Listener>>>> = Rc::new(RefCell::new(HashMap::new()));
        let add: Rc<AddListenerFn> = {
            let global = global.clone();
            Rc::new(move |target, event_type, listener| match target {
                Some(target) => target.push_listener(event_type, listener.clone()),
                None => global
                    .borrow_mut()
                    .entry(event_type.to_string())
                    .or_default()
                    .push(listener.clone()),
            })
        };
        let remove: Rc<RemoveListenerFn> = {
            let global = global.clone();
            Rc::new(move |target, event_type, listener| {
                let id = listener.callback().id();
                match target {
                    Some(target) => {
                        target.drop_listener(event_type, id);
                    }
                    None => {
                        if let Some(list) = global.borrow_mut().get_mut(event_type) {
                            if let Some(index) = list.iter().position(|l| l.callback().id() == id) {
                                list.remove(index);
                            }
                        }
                    }
                }
            })
        };
        Self {
            add_event_listener: Slot::filled("addEventListener", add),
            remove_event_listener: Slot::filled("removeEventListener", remove),
            global,
        }
    }

    pub(crate) fn absent() -> Self {
        Self {
            add_event_listener: Slot::absent("addEventListener"),
            remove_event_listener: Slot::absent("removeEventListener"),
            global: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub(crate) fn global_listeners_for(&self, event_type: &str) -> Vec<Listener> {
        self.global.borrow().get(event_type).cloned().unwrap_or_default()
    }

    pub(crate) fn global_listener_count(&self) -> usize {
        self.global.borrow().values().map(Vec::len).sum()
    }
}

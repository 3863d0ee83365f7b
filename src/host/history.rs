use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::instrument::patch::Slot;

pub type NavigateFn = dyn Fn(Option<&Value>);

/// History surface. A `None` or non-string url must never throw: strings
/// replace the location, other values coerce to their string form, absent
/// values leave the location untouched.
pub struct HistoryApi {
    pub push_state: Slot<NavigateFn>,
    pub replace_state: Slot<NavigateFn>,
    location: Rc<RefCell<String>>,
}

pub(crate) fn coerce_url(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl HistoryApi {
    pub(crate) fn native(initial_location: &str) -> Self {
        let location = Rc::new(RefCell::new(initial_location.to_string()));
        let navigate = |location: Rc<RefCell<String>>| -> Rc<NavigateFn> {
            Rc::new(move |url| {
                if let Some(value) = url {
                    *location.borrow_mut() = coerce_url(value);
                }
            })
        };
        Self {
            push_state: Slot::filled("pushState", navigate(location.clone())),
            replace_state: Slot::filled("replaceState", navigate(location.clone())),
            location,
        }
    }

    pub(crate) fn absent(initial_location: &str) -> Self {
        Self {
            push_state: Slot::absent("pushState"),
            replace_state: Slot::absent("replaceState"),
            location: Rc::new(RefCell::new(initial_location.to_string())),
        }
    }

    pub fn location(&self) -> String {
        self.location.borrow().clone()
    }

    pub(crate) fn location_cell(&self) -> Rc<RefCell<String>> {
        self.location.clone()
    }
}

use std::cell::RefCell;
use std::rc::Rc;

use crate::client::Client;
use crate::host::callback::{Callback, HandleEventReceiver};
use crate::host::clock::TimerWheel;
use crate::host::target::Target;
use crate::host::Host;

use super::dispatcher::{Dispatcher, EventName, EventPayload, InstrumentationEvent};
use super::mechanism::{invoke_guarded, DEFAULT_TARGET};
use super::patch::PatchError;
use super::registry::CallbackRegistry;

/// Listener-registration interceptor.
///
/// Adding a listener swaps in a wrapper that publishes ui instrumentation
/// events and runs the original inside the mechanism boundary. The registry
/// keeps the original↔wrapper association so re-adding reuses the wrapper
/// (no nesting) and removal works with either reference.
pub(crate) fn install(
    host: &Host,
    client: &Rc<Client>,
    dispatcher: &Rc<Dispatcher>,
    registry: &Rc<RefCell<CallbackRegistry>>,
    wheel: &TimerWheel,
) -> Result<(), PatchError> {
    let api = host.dom_api();
    {
        let client = client.clone();
        let dispatcher = dispatcher.clone();
        let registry = registry.clone();
        let wheel = wheel.clone();
        api.add_event_listener.patch(move |original| {
            Rc::new(move |target, event_type, listener| {
                let wrapper =
                    resolve_or_wrap(&registry, &client, &dispatcher, &wheel, listener.callback());
                original(target, event_type, &listener.with_callback(wrapper));
            })
        })?;
    }
    {
        let registry = registry.clone();
        api.remove_event_listener.patch(move |original| {
            Rc::new(move |target, event_type, listener| {
                // The caller may hold the original or the wrapper; either
                // must deregister the wrapper that was actually installed.
                let resolved = registry
                    .borrow_mut()
                    .resolve_for_removal(listener.callback().id());
                match resolved {
                    Some(wrapper) => original(target, event_type, &listener.with_callback(wrapper)),
                    None => original(target, event_type, listener),
                }
            })
        })?;
    }
    Ok(())
}

fn resolve_or_wrap(
    registry: &Rc<RefCell<CallbackRegistry>>,
    client: &Rc<Client>,
    dispatcher: &Rc<Dispatcher>,
    wheel: &TimerWheel,
    callback: &Callback,
) -> Callback {
    {
        let mut reg = registry.borrow_mut();
        if reg.is_wrapper(callback.id()) {
            reg.note_registration(callback.id());
            return callback.clone();
        }
        if let Some(wrapper) = reg.wrapper_for(callback.id()) {
            reg.note_registration(callback.id());
            return wrapper;
        }
    }
    let wrapper = listener_wrapper(
        client.clone(),
        dispatcher.clone(),
        wheel.clone(),
        callback.clone(),
    );
    registry.borrow_mut().insert(callback.clone(), wrapper.clone());
    wrapper
}

fn listener_wrapper(
    client: Rc<Client>,
    dispatcher: Rc<Dispatcher>,
    wheel: TimerWheel,
    original: Callback,
) -> Callback {
    Callback::new(move |invocation| {
        // The breadcrumb event is published regardless of what the listener
        // does with the exception path below.
        if let Some(event) = &invocation.event {
            if let Some(name) = ui_event_name(event.event_type()) {
                let target = event.target().ok().flatten().cloned();
                dispatcher.publish(InstrumentationEvent {
                    name,
                    target,
                    payload: EventPayload::Dom {
                        event: event.clone(),
                        global: invocation.context.is_none(),
                    },
                    timestamp: wheel.now(),
                });
            }
        }
        invoke_guarded(
            &client,
            "addEventListener",
            Some(receiver_type_name(invocation)),
            &original,
            invocation,
        )
    })
}

/// Type name of the receiver the callback runs against: the visited node
/// for a plain function, the listener object for a `handleEvent`-style
/// registration, and the default when there is no receiver (global scope).
fn receiver_type_name(invocation: &crate::host::callback::Invocation) -> String {
    invocation
        .context
        .as_ref()
        .and_then(|cx| {
            cx.downcast_ref::<Target>()
                .map(|t| t.type_name().to_string())
                .or_else(|| {
                    cx.downcast_ref::<HandleEventReceiver>()
                        .map(|r| r.type_name.clone())
                })
        })
        .unwrap_or_else(|| DEFAULT_TARGET.to_string())
}

fn ui_event_name(event_type: &str) -> Option<EventName> {
    match event_type {
        "click" | "dblclick" => Some(EventName::Click),
        "keypress" | "input" => Some(EventName::Keypress),
        _ => None,
    }
}

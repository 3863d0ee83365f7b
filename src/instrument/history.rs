use std::cell::RefCell;
use std::rc::Rc;

use crate::host::clock::TimerWheel;
use crate::host::Host;

use super::dispatcher::{Dispatcher, EventName, EventPayload, InstrumentationEvent};
use super::patch::PatchError;

/// History navigation interceptor: one navigation event per
/// `pushState`/`replaceState` call, carrying the location before and after.
/// Absent or odd url arguments never throw and never suppress later calls.
pub(crate) fn install(
    host: &Host,
    dispatcher: &Rc<Dispatcher>,
    wheel: &TimerWheel,
) -> Result<(), PatchError> {
    let api = host.history_api();
    let location = api.location_cell();
    {
        let dispatcher = dispatcher.clone();
        let wheel = wheel.clone();
        let location = location.clone();
        api.push_state
            .patch(move |original| navigation_wrapper(original, dispatcher.clone(), wheel.clone(), location.clone()))?;
    }
    {
        let dispatcher = dispatcher.clone();
        let wheel = wheel.clone();
        api.replace_state
            .patch(move |original| navigation_wrapper(original, dispatcher.clone(), wheel.clone(), location))?;
    }
    Ok(())
}

fn navigation_wrapper(
    original: Rc<crate::host::history::NavigateFn>,
    dispatcher: Rc<Dispatcher>,
    wheel: TimerWheel,
    location: Rc<RefCell<String>>,
) -> Rc<crate::host::history::NavigateFn> {
    Rc::new(move |url| {
        let from = location.borrow().clone();
        original(url);
        let to = location.borrow().clone();
        dispatcher.publish(InstrumentationEvent {
            name: EventName::Navigation,
            target: None,
            payload: EventPayload::Navigation { from, to },
            timestamp: wheel.now(),
        });
    })
}

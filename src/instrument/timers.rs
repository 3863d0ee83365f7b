use std::rc::Rc;

use crate::client::Client;
use crate::host::callback::Callback;
use crate::host::clock::TimerWheel;
use crate::host::Host;

use super::dispatcher::{Dispatcher, EventName, EventPayload, InstrumentationEvent};
use super::mechanism::invoke_guarded;
use super::patch::PatchError;

/// Timer and animation-frame interceptor. Only the scheduled callback is
/// wrapped; the call-site context travels through the wrapper untouched so
/// bound callbacks observe the receiver they were bound to.
pub(crate) fn install(
    host: &Host,
    client: &Rc<Client>,
    dispatcher: &Rc<Dispatcher>,
    wheel: &TimerWheel,
) -> Result<(), PatchError> {
    let api = host.timer_api();
    {
        let client = client.clone();
        let dispatcher = dispatcher.clone();
        let wheel = wheel.clone();
        api.set_timeout.patch(move |original| {
            Rc::new(move |callback, delay_ms, context| {
                let wrapped = timer_wrapper(
                    client.clone(),
                    dispatcher.clone(),
                    wheel.clone(),
                    "setTimeout",
                    callback.clone(),
                );
                original(&wrapped, delay_ms, context)
            })
        })?;
    }
    {
        let client = client.clone();
        let dispatcher = dispatcher.clone();
        let wheel = wheel.clone();
        api.set_interval.patch(move |original| {
            Rc::new(move |callback, every_ms, context| {
                let wrapped = timer_wrapper(
                    client.clone(),
                    dispatcher.clone(),
                    wheel.clone(),
                    "setInterval",
                    callback.clone(),
                );
                original(&wrapped, every_ms, context)
            })
        })?;
    }
    {
        let client = client.clone();
        let dispatcher = dispatcher.clone();
        let wheel = wheel.clone();
        api.request_animation_frame.patch(move |original| {
            Rc::new(move |callback, context| {
                let wrapped = timer_wrapper(
                    client.clone(),
                    dispatcher.clone(),
                    wheel.clone(),
                    "requestAnimationFrame",
                    callback.clone(),
                );
                original(&wrapped, context)
            })
        })?;
    }
    Ok(())
}

fn timer_wrapper(
    client: Rc<Client>,
    dispatcher: Rc<Dispatcher>,
    wheel: TimerWheel,
    api: &'static str,
    original: Callback,
) -> Callback {
    Callback::new(move |invocation| {
        dispatcher.publish(InstrumentationEvent {
            name: EventName::TimerFire,
            target: None,
            payload: EventPayload::TimerFire { api },
            timestamp: wheel.now(),
        });
        invoke_guarded(&client, api, None, &original, invocation)
    })
}

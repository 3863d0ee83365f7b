use std::any::Any;
use std::rc::Rc;

use crate::instrument::patch::Slot;

use super::callback::{Callback, Invocation};
use super::clock::{TimerHandle, TimerWheel};

/// Frame cadence for animation-frame scheduling.
pub const FRAME_MS: u64 = 16;

pub type ScheduleFn = dyn Fn(&Callback, u64, Option<Rc<dyn Any>>) -> TimerHandle;
pub type FrameFn = dyn Fn(&Callback, Option<Rc<dyn Any>>) -> TimerHandle;

/// Timer surface. The context argument is the receiver captured at the call
/// site; the natives forward it to the callback verbatim, and so must any
/// wrapper installed over them.
pub struct TimerApi {
    pub set_timeout: Slot<ScheduleFn>,
    pub set_interval: Slot<ScheduleFn>,
    pub request_animation_frame: Slot<FrameFn>,
}

impl TimerApi {
    pub(crate) fn native(wheel: &TimerWheel) -> Self {
        let set_timeout: Rc<ScheduleFn> = {
            let wheel = wheel.clone();
            Rc::new(move |callback, delay_ms, context| {
                let callback = callback.clone();
                let invocation = Invocation {
                    context,
                    event: None,
                };
                wheel.schedule(delay_ms, move || {
                    let _ = callback.invoke(&invocation);
                })
            })
        };
        let set_interval: Rc<ScheduleFn> = {
            let wheel = wheel.clone();
            Rc::new(move |callback, every_ms, context| {
                let callback = callback.clone();
                let invocation = Invocation {
                    context,
                    event: None,
                };
                wheel.schedule_repeating(every_ms, move || {
                    let _ = callback.invoke(&invocation);
                })
            })
        };
        let request_animation_frame: Rc<FrameFn> = {
            let wheel = wheel.clone();
            Rc::new(move |callback, context| {
                let callback = callback.clone();
                let invocation = Invocation {
                    context,
                    event: None,
                };
                wheel.schedule(FRAME_MS, move || {
                    let _ = callback.invoke(&invocation);
                })
            })
        };
        Self {
            set_timeout: Slot::filled("setTimeout", set_timeout),
            set_interval: Slot::filled("setInterval", set_interval),
            request_animation_frame: Slot::filled("requestAnimationFrame", request_animation_frame),
        }
    }

    pub(crate) fn absent() -> Self {
        Self {
            set_timeout: Slot::absent("setTimeout"),
            set_interval: Slot::absent("setInterval"),
            request_animation_frame: Slot::absent("requestAnimationFrame"),
        }
    }
}

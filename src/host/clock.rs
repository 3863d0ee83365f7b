use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;

/// Monotonic host time in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Timestamp {
    pub ms: u64,
}

pub const TICK_MS: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

struct ScheduledTask {
    run: Box<dyn FnMut()>,
    every: Option<u64>,
}

#[derive(Default)]
struct WheelInner {
    now_ms: u64,
    next_seq: u64,
    // Keyed by (deadline, seq) so due tasks fire in schedule order.
    tasks: BTreeMap<(u64, u64), ScheduledTask>,
    // Mid-flight cancel flags; only the running task's seq may live here,
    // and it is drained right after the run.
    canceled: HashSet<u64>,
    running: Option<u64>,
}

/// Single-threaded timer wheel. All deferral in the system goes through
/// here: user timers, animation frames, and the breadcrumb debounce timer.
/// Tests advance it manually; the demo driver pumps it from tokio time.
#[derive(Clone)]
pub struct TimerWheel {
    inner: Rc<RefCell<WheelInner>>,
}

impl TimerWheel {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(WheelInner::default())),
        }
    }

    pub fn now(&self) -> Timestamp {
        Timestamp {
            ms: self.inner.borrow().now_ms,
        }
    }

    pub fn schedule(&self, delay_ms: u64, run: impl FnMut() + 'static) -> TimerHandle {
        self.insert(delay_ms, None, Box::new(run))
    }

    pub fn schedule_repeating(&self, every_ms: u64, run: impl FnMut() + 'static) -> TimerHandle {
        self.insert(every_ms, Some(every_ms.max(1)), Box::new(run))
    }

    fn insert(&self, delay_ms: u64, every: Option<u64>, run: Box<dyn FnMut()>) -> TimerHandle {
        let mut inner = self.inner.borrow_mut();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let deadline = inner.now_ms + delay_ms;
        inner.tasks.insert((deadline, seq), ScheduledTask { run, every });
        TimerHandle(seq)
    }

    pub fn cancel(&self, handle: TimerHandle) -> bool {
        let mut inner = self.inner.borrow_mut();
        let key = inner.tasks.keys().find(|k| k.1 == handle.0).copied();
        match key {
            Some(k) => {
                inner.tasks.remove(&k);
                true
            }
            None => {
                // A mid-flight task canceling itself gets flagged so it is
                // not re-armed. A handle that already fired is a no-op.
                if inner.running == Some(handle.0) {
                    inner.canceled.insert(handle.0);
                }
                false
            }
        }
    }

    /// Advance the clock, firing every due task in deadline order. Tasks may
    /// schedule or cancel other tasks while running.
    pub fn advance(&self, ms: u64) {
        let deadline_limit = self.inner.borrow().now_ms + ms;
        loop {
            let due = {
                let mut inner = self.inner.borrow_mut();
                let key = inner.tasks.keys().next().copied();
                match key {
                    Some(k) if k.0 <= deadline_limit => {
                        inner.now_ms = inner.now_ms.max(k.0);
                        inner.running = Some(k.1);
                        inner.tasks.remove(&k).map(|task| (k, task))
                    }
                    _ => None,
                }
            };
            let Some(((deadline, seq), mut task)) = due else {
                break;
            };
            (task.run)();
            let mut inner = self.inner.borrow_mut();
            inner.running = None;
            let canceled = inner.canceled.remove(&seq);
            if let Some(every) = task.every {
                if !canceled {
                    inner.tasks.insert((deadline + every, seq), task);
                }
            }
        }
        self.inner.borrow_mut().now_ms = deadline_limit;
    }

    pub fn pending_tasks(&self) -> usize {
        self.inner.borrow().tasks.len()
    }

    /// Live mid-flight cancel flags. Zero whenever no task is running.
    pub fn cancel_flags(&self) -> usize {
        self.inner.borrow().canceled.len()
    }

    /// Async driver loop. Pumps the wheel at a fixed cadence from tokio time.
    pub async fn run_for(&self, duration: Duration) {
        let mut cadence = tokio::time::interval(Duration::from_millis(TICK_MS));
        cadence.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut elapsed = 0u64;
        let total = duration.as_millis() as u64;
        while elapsed < total {
            cadence.tick().await;
            self.advance(TICK_MS);
            elapsed += TICK_MS;
        }
    }
}

impl Default for TimerWheel {
    fn default() -> Self {
        Self::new()
    }
}

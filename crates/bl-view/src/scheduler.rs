//! Injectable per-frame callback source.
//!
//! A host subscribes a tick callback and gets back a `CancelToken`. Once the
//! token is cancelled (or dropped) the callback is never invoked again, even
//! if cancellation happens from inside a tick.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::trace;

/// Per-frame callback; receives the elapsed wall time since the previous frame (s).
pub type TickFn = Box<dyn FnMut(f64)>;

pub trait FrameScheduler {
    fn subscribe(&self, tick: TickFn) -> CancelToken;
}

/// Cancels its subscription when `cancel` is called or when dropped.
pub struct CancelToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancelToken {
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

impl Drop for CancelToken {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

struct Subscription {
    cancelled: Rc<Cell<bool>>,
    tick: TickFn,
}

/// Scheduler driven by explicit `tick` calls, for tests and headless hosts.
///
/// Clones share the same subscription list.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    subscriptions: Rc<RefCell<Vec<Subscription>>>,
    frames: Rc<Cell<u64>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one display frame: invoke every live callback with `elapsed`.
    ///
    /// Returns the number of callbacks invoked. Subscriptions added during the
    /// frame are first ticked on the next frame.
    pub fn tick(&self, elapsed: f64) -> usize {
        let mut current = std::mem::take(&mut *self.subscriptions.borrow_mut());
        let mut invoked = 0;
        for sub in current.iter_mut() {
            if sub.cancelled.get() {
                continue;
            }
            (sub.tick)(elapsed);
            invoked += 1;
        }
        let frame = self.frames.get() + 1;
        self.frames.set(frame);
        trace!(frame, invoked, "scheduler tick");

        let mut subs = self.subscriptions.borrow_mut();
        let added = std::mem::take(&mut *subs);
        current.extend(added);
        current.retain(|s| !s.cancelled.get());
        *subs = current;
        invoked
    }

    /// Live (not cancelled) subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscriptions
            .borrow()
            .iter()
            .filter(|s| !s.cancelled.get())
            .count()
    }

    pub fn frames(&self) -> u64 {
        self.frames.get()
    }
}

impl FrameScheduler for ManualScheduler {
    fn subscribe(&self, tick: TickFn) -> CancelToken {
        let cancelled = Rc::new(Cell::new(false));
        self.subscriptions.borrow_mut().push(Subscription {
            cancelled: Rc::clone(&cancelled),
            tick,
        });
        CancelToken { cancelled }
    }
}

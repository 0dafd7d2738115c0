use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{keep_first, GessoError};
use crate::frame_clock::FrameClock;
use crate::platform::{Clock, RuntimeScheduler};

pub type TimerId = u64;
pub type FrameCallbackId = u64;

/// Outcome of a task run by the runtime; failures surface to whoever pumps it.
pub type TaskResult = Result<(), GessoError>;

type TimerTask = Box<dyn FnOnce() -> TaskResult + 'static>;
type FrameTask = Box<dyn FnOnce(u64) -> TaskResult + 'static>;

struct TimerEntry {
    id: TimerId,
    deadline: Duration,
    callback: TimerTask,
}

struct FrameCallbackEntry {
    id: FrameCallbackId,
    callback: FrameTask,
}

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    clock: Arc<dyn Clock>,
    needs_frame: Cell<bool>,
    timers: RefCell<Vec<TimerEntry>>, // sorted by deadline, FIFO on ties
    frame_callbacks: RefCell<VecDeque<FrameCallbackEntry>>,
    next_id: Cell<u64>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn RuntimeScheduler>, clock: Arc<dyn Clock>) -> Self {
        Self {
            scheduler,
            clock,
            needs_frame: Cell::new(false),
            timers: RefCell::new(Vec::new()),
            frame_callbacks: RefCell::new(VecDeque::new()),
            next_id: Cell::new(1),
        }
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn now(&self) -> Duration {
        self.clock.elapsed()
    }

    fn schedule_frame(&self) {
        self.needs_frame.set(true);
        self.scheduler.schedule_frame();
    }

    fn set_timeout(&self, delay: Duration, callback: TimerTask) -> TimerId {
        let id = self.next_id();
        let deadline = self.now() + delay;
        {
            let mut timers = self.timers.borrow_mut();
            let index = timers.partition_point(|entry| entry.deadline <= deadline);
            timers.insert(
                index,
                TimerEntry {
                    id,
                    deadline,
                    callback,
                },
            );
        }
        self.scheduler.schedule_wakeup(deadline);
        id
    }

    fn cancel_timer(&self, id: TimerId) {
        let mut timers = self.timers.borrow_mut();
        if let Some(index) = timers.iter().position(|entry| entry.id == id) {
            timers.remove(index);
        }
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.timers.borrow().first().map(|entry| entry.deadline)
    }

    fn has_timers(&self) -> bool {
        !self.timers.borrow().is_empty()
    }

    fn run_due_timers(&self) -> TaskResult {
        let now = self.now();
        let mut first_error = None;
        loop {
            let task = {
                let mut timers = self.timers.borrow_mut();
                match timers.first() {
                    Some(entry) if entry.deadline <= now => timers.remove(0).callback,
                    _ => break,
                }
            };
            keep_first(&mut first_error, task());
        }
        first_error.map_or(Ok(()), Err)
    }

    fn has_frame_callbacks(&self) -> bool {
        !self.frame_callbacks.borrow().is_empty()
    }

    fn register_frame_callback(&self, callback: FrameTask) -> FrameCallbackId {
        let id = self.next_id();
        self.frame_callbacks
            .borrow_mut()
            .push_back(FrameCallbackEntry { id, callback });
        self.schedule_frame();
        id
    }

    fn cancel_frame_callback(&self, id: FrameCallbackId) {
        let mut callbacks = self.frame_callbacks.borrow_mut();
        if let Some(index) = callbacks.iter().position(|entry| entry.id == id) {
            callbacks.remove(index);
        }
        if callbacks.is_empty() {
            self.needs_frame.set(false);
        }
    }

    fn drain_frame_callbacks(&self, frame_time_nanos: u64) -> TaskResult {
        // Only callbacks queued before the drain run; each stays cancellable
        // until its turn comes.
        let due: Vec<FrameCallbackId> = self
            .frame_callbacks
            .borrow()
            .iter()
            .map(|entry| entry.id)
            .collect();
        self.needs_frame.set(false);
        let mut first_error = None;
        for id in due {
            let callback = {
                let mut callbacks = self.frame_callbacks.borrow_mut();
                let Some(index) = callbacks.iter().position(|entry| entry.id == id) else {
                    continue;
                };
                callbacks.remove(index).map(|entry| entry.callback)
            };
            if let Some(callback) = callback {
                keep_first(&mut first_error, callback(frame_time_nanos));
            }
        }
        self.needs_frame.set(self.has_frame_callbacks());
        first_error.map_or(Ok(()), Err)
    }
}

/// Single-threaded cooperative event loop state shared by every controller
/// on one host.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler, clock)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    pub fn now(&self) -> Duration {
        self.inner.now()
    }

    pub fn needs_frame(&self) -> bool {
        self.inner.needs_frame.get()
    }

    pub fn supports_frame_sync(&self) -> bool {
        self.inner.scheduler.supports_frame_sync()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.inner.next_deadline()
    }

    pub fn has_pending_work(&self) -> bool {
        self.inner.has_timers() || self.inner.has_frame_callbacks()
    }

    /// Fires every timer whose deadline has passed on the runtime clock.
    pub fn run_due_timers(&self) -> TaskResult {
        self.inner.run_due_timers()
    }

    /// Delivers a frame signal to every callback registered before this call.
    pub fn drain_frame_callbacks(&self, frame_time_nanos: u64) -> TaskResult {
        self.inner.drain_frame_callbacks(frame_time_nanos)
    }

    pub fn frame_clock(&self) -> FrameClock {
        FrameClock::new(self.handle())
    }
}

/// Weak reference to a [`Runtime`]; operations on a dropped runtime are no-ops.
#[derive(Clone)]
pub struct RuntimeHandle(Weak<RuntimeInner>);

impl RuntimeHandle {
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    pub fn now(&self) -> Duration {
        self.0
            .upgrade()
            .map(|inner| inner.now())
            .unwrap_or_default()
    }

    pub fn supports_frame_sync(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.scheduler.supports_frame_sync())
            .unwrap_or(false)
    }

    pub fn set_timeout(
        &self,
        delay: Duration,
        callback: impl FnOnce() -> TaskResult + 'static,
    ) -> Option<TimerId> {
        self.0
            .upgrade()
            .map(|inner| inner.set_timeout(delay, Box::new(callback)))
    }

    pub fn cancel_timer(&self, id: TimerId) {
        if let Some(inner) = self.0.upgrade() {
            inner.cancel_timer(id);
        }
    }

    pub fn register_frame_callback(
        &self,
        callback: impl FnOnce(u64) -> TaskResult + 'static,
    ) -> Option<FrameCallbackId> {
        self.0
            .upgrade()
            .map(|inner| inner.register_frame_callback(Box::new(callback)))
    }

    pub fn cancel_frame_callback(&self, id: FrameCallbackId) {
        if let Some(inner) = self.0.upgrade() {
            inner.cancel_frame_callback(id);
        }
    }

    pub fn drain_frame_callbacks(&self, frame_time_nanos: u64) -> TaskResult {
        match self.0.upgrade() {
            Some(inner) => inner.drain_frame_callbacks(frame_time_nanos),
            None => Ok(()),
        }
    }

    pub fn has_frame_callbacks(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.has_frame_callbacks())
            .unwrap_or(false)
    }

    pub fn pending_timers(&self) -> usize {
        self.0
            .upgrade()
            .map(|inner| inner.timers.borrow().len())
            .unwrap_or(0)
    }

    pub fn frame_clock(&self) -> FrameClock {
        FrameClock::new(self.clone())
    }
}

#[cfg(test)]
pub(crate) use test_support::{TestClock, TestRuntime, TestScheduler};

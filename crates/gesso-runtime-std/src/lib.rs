//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides concrete implementations of the platform
//! abstraction traits defined in `gesso-core`. Hosts construct a
//! [`StdRuntime`], hand its [`Runtime`] to a [`gesso_core::Host`] and then
//! either [`pump`](StdRuntime::pump) it from their own event loop or let
//! [`run_for`](StdRuntime::run_for) block the thread.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use gesso_core::{Clock, FrameClock, Runtime, RuntimeHandle, RuntimeScheduler, TaskResult};

type FrameWaker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Scheduler that delegates work to Rust's threading primitives.
pub struct StdScheduler {
    frame_requested: AtomicBool,
    frame_sync: bool,
    next_wakeup: Mutex<Option<Duration>>,
    frame_waker: RwLock<Option<FrameWaker>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self::with_frame_sync(true)
    }

    /// With `frame_sync == false` the frame clock ticks straight from timers.
    pub fn with_frame_sync(frame_sync: bool) -> Self {
        Self {
            frame_requested: AtomicBool::new(false),
            frame_sync,
            next_wakeup: Mutex::new(None),
            frame_waker: RwLock::new(None),
        }
    }

    /// Returns whether a frame has been requested since the last call.
    pub fn take_frame_request(&self) -> bool {
        self.frame_requested.swap(false, Ordering::SeqCst)
    }

    /// Earliest timer deadline announced since the last call.
    pub fn take_wakeup(&self) -> Option<Duration> {
        self.next_wakeup
            .lock()
            .ok()
            .and_then(|mut wakeup| wakeup.take())
    }

    /// Registers a waker that will be invoked whenever a new frame is scheduled.
    pub fn set_frame_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        if let Ok(mut slot) = self.frame_waker.write() {
            log::debug!("frame waker installed");
            *slot = Some(Arc::new(waker));
        }
    }

    /// Clears any registered frame waker.
    pub fn clear_frame_waker(&self) {
        if let Ok(mut slot) = self.frame_waker.write() {
            if slot.take().is_some() {
                log::debug!("frame waker cleared");
            }
        }
    }

    fn wake(&self) {
        let waker = self
            .frame_waker
            .read()
            .ok()
            .and_then(|slot| slot.clone());
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field(
                "frame_requested",
                &self.frame_requested.load(Ordering::SeqCst),
            )
            .field("frame_sync", &self.frame_sync)
            .finish()
    }
}

impl RuntimeScheduler for StdScheduler {
    fn schedule_frame(&self) {
        self.frame_requested.store(true, Ordering::SeqCst);
        self.wake();
    }

    fn schedule_wakeup(&self, deadline: Duration) {
        if let Ok(mut wakeup) = self.next_wakeup.lock() {
            *wakeup = Some(wakeup.map_or(deadline, |current| current.min(deadline)));
        }
        self.wake();
    }

    fn supports_frame_sync(&self) -> bool {
        self.frame_sync
    }
}

/// Clock implementation backed by [`std::time::Instant`].
#[derive(Debug, Clone)]
pub struct StdClock {
    origin: Instant,
}

impl StdClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn origin(&self) -> Instant {
        self.origin
    }

    /// Converts a runtime-clock offset into a wall-clock instant.
    pub fn instant_at(&self, offset: Duration) -> Instant {
        self.origin + offset
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Convenience container bundling the standard scheduler and clock.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
    clock: Arc<StdClock>,
    runtime: Runtime,
}

impl StdRuntime {
    /// Creates a new standard runtime instance.
    pub fn new() -> Self {
        Self::with_scheduler(StdScheduler::new())
    }

    /// Runtime whose host never delivers frame signals.
    pub fn without_frame_sync() -> Self {
        Self::with_scheduler(StdScheduler::with_frame_sync(false))
    }

    fn with_scheduler(scheduler: StdScheduler) -> Self {
        let scheduler = Arc::new(scheduler);
        let clock = Arc::new(StdClock::new());
        let runtime = Runtime::new(scheduler.clone(), clock.clone());
        Self {
            scheduler,
            clock,
            runtime,
        }
    }

    /// Returns a [`gesso_core::Runtime`] configured with the standard scheduler.
    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    /// Returns a handle to the runtime.
    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    /// Returns the runtime's frame clock.
    pub fn frame_clock(&self) -> FrameClock {
        self.runtime.frame_clock()
    }

    /// Returns the scheduler implementation.
    pub fn scheduler(&self) -> Arc<StdScheduler> {
        Arc::clone(&self.scheduler)
    }

    /// Returns the clock implementation.
    pub fn clock(&self) -> Arc<StdClock> {
        Arc::clone(&self.clock)
    }

    /// Time since the runtime was created.
    pub fn now(&self) -> Duration {
        self.runtime.now()
    }

    /// Returns whether a frame was requested since the last poll.
    pub fn take_frame_request(&self) -> bool {
        self.scheduler.take_frame_request()
    }

    /// Registers a waker to be called when the runtime schedules a new frame.
    pub fn set_frame_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_frame_waker(waker);
    }

    /// Clears any previously registered frame waker.
    pub fn clear_frame_waker(&self) {
        self.scheduler.clear_frame_waker();
    }

    /// Drains pending frame callbacks using the provided frame timestamp in nanoseconds.
    pub fn drain_frame_callbacks(&self, frame_time_nanos: u64) -> TaskResult {
        self.runtime.drain_frame_callbacks(frame_time_nanos)
    }

    /// Wall-clock instant of the earliest armed timer.
    pub fn next_wakeup(&self) -> Option<Instant> {
        self.runtime
            .next_deadline()
            .map(|deadline| self.clock.instant_at(deadline))
    }

    /// Fires due timers, then delivers a frame signal if one is wanted.
    pub fn pump(&self) -> TaskResult {
        self.runtime.run_due_timers()?;
        if self.runtime.needs_frame() {
            self.scheduler.take_frame_request();
            let now = self.runtime.now().as_nanos() as u64;
            self.runtime.drain_frame_callbacks(now)?;
        }
        Ok(())
    }

    /// Pumps the runtime on the current thread for `duration`, sleeping until
    /// the next timer between pumps. Returns early on the first failure.
    pub fn run_for(&self, duration: Duration) -> TaskResult {
        let end = Instant::now() + duration;
        loop {
            if let Err(err) = self.pump() {
                log::warn!("runtime pump failed: {err}");
                return Err(err);
            }
            let now = Instant::now();
            if now >= end {
                return Ok(());
            }
            if self.runtime.needs_frame() {
                continue;
            }
            let wake_at = self.next_wakeup().map_or(end, |wakeup| wakeup.min(end));
            if wake_at > now {
                log::trace!("sleeping {:?} until next wakeup", wake_at - now);
                thread::sleep(wake_at - now);
            }
        }
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("clock", &self.clock)
            .finish()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}

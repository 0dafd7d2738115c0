use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use gesso_core::{Clock, RuntimeScheduler};

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Moves the clock to `at`; never moves it backwards.
    pub fn set(&self, at: Duration) {
        self.nanos.fetch_max(at.as_nanos() as u64, Ordering::SeqCst);
    }

    pub fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        self.now()
    }
}

/// Scheduler that records what the runtime asked for.
#[derive(Debug)]
pub struct TestScheduler {
    frames_requested: AtomicUsize,
    frame_sync: AtomicBool,
    wakeups: Mutex<Vec<Duration>>,
}

impl Default for TestScheduler {
    fn default() -> Self {
        Self {
            frames_requested: AtomicUsize::new(0),
            frame_sync: AtomicBool::new(true),
            wakeups: Mutex::new(Vec::new()),
        }
    }
}

impl TestScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduler for a host without a "ready to paint" signal.
    pub fn without_frame_sync() -> Self {
        let scheduler = Self::default();
        scheduler.frame_sync.store(false, Ordering::SeqCst);
        scheduler
    }

    pub fn frames_requested(&self) -> usize {
        self.frames_requested.load(Ordering::SeqCst)
    }

    /// Timer deadlines announced so far, in announcement order.
    pub fn wakeups(&self) -> Vec<Duration> {
        self.wakeups
            .lock()
            .map(|wakeups| wakeups.clone())
            .unwrap_or_default()
    }
}

impl RuntimeScheduler for TestScheduler {
    fn schedule_frame(&self) {
        self.frames_requested.fetch_add(1, Ordering::SeqCst);
    }

    fn schedule_wakeup(&self, deadline: Duration) {
        if let Ok(mut wakeups) = self.wakeups.lock() {
            wakeups.push(deadline);
        }
    }

    fn supports_frame_sync(&self) -> bool {
        self.frame_sync.load(Ordering::SeqCst)
    }
}

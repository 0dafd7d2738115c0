use std::sync::Arc;
use std::time::Duration;

use gesso_core::{
    EventName, EventResult, Gesso, GessoError, Host, InputEvent, Runtime, SurfaceOptions,
    SurfaceRegistry, TaskResult,
};
use gesso_ui_graphics::{Point, Size};

use super::clock::{ManualClock, TestScheduler};
use super::surface::MemorySurface;

const DEFAULT_VIEWPORT: Size = Size::new(800, 600);

/// Virtual-time host over [`MemorySurface`]s.
///
/// Frames are delivered as soon as they are requested, so a tick scheduled
/// for a deadline runs exactly at that deadline on the manual clock.
pub struct TestHost {
    host: Host<SurfaceRegistry<MemorySurface>>,
    scheduler: Arc<TestScheduler>,
    clock: Arc<ManualClock>,
}

impl TestHost {
    pub fn new() -> Self {
        Self::with_scheduler(TestScheduler::new(), DEFAULT_VIEWPORT)
    }

    pub fn with_viewport(viewport: Size) -> Self {
        Self::with_scheduler(TestScheduler::new(), viewport)
    }

    pub fn without_frame_sync() -> Self {
        Self::with_scheduler(TestScheduler::without_frame_sync(), DEFAULT_VIEWPORT)
    }

    fn with_scheduler(scheduler: TestScheduler, viewport: Size) -> Self {
        let scheduler = Arc::new(scheduler);
        let clock = Arc::new(ManualClock::new());
        let runtime = Runtime::new(scheduler.clone(), clock.clone());
        let registry = SurfaceRegistry::new(viewport, MemorySurface::new);
        Self {
            host: Host::new(registry, runtime),
            scheduler,
            clock,
        }
    }

    pub fn host(&self) -> &Host<SurfaceRegistry<MemorySurface>> {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut Host<SurfaceRegistry<MemorySurface>> {
        &mut self.host
    }

    pub fn runtime(&self) -> &Runtime {
        self.host.runtime()
    }

    pub fn scheduler(&self) -> &TestScheduler {
        &self.scheduler
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Shortcut for [`Gesso::create`] on this host.
    pub fn create(&mut self, options: &SurfaceOptions) -> Result<Gesso<MemorySurface>, GessoError> {
        Gesso::create(&mut self.host, options)
    }

    /// Delivers a frame signal if one was requested.
    pub fn pump_frame(&self) -> TaskResult {
        let runtime = self.host.runtime();
        if runtime.needs_frame() {
            let now = self.clock.now().as_nanos() as u64;
            runtime.drain_frame_callbacks(now)?;
        }
        Ok(())
    }

    /// Advances virtual time by `by`, stopping at every timer deadline on the
    /// way to fire it and deliver any frame it requested.
    pub fn advance(&self, by: Duration) -> TaskResult {
        let target = self.clock.now() + by;
        let runtime = self.host.runtime();
        while let Some(deadline) = runtime.next_deadline().filter(|deadline| *deadline <= target) {
            self.clock.set(deadline);
            runtime.run_due_timers()?;
            self.pump_frame()?;
        }
        self.clock.set(target);
        runtime.run_due_timers()?;
        self.pump_frame()
    }

    pub fn click(&self, at: Point) -> EventResult {
        self.host.dispatch_pointer(EventName::Click, at)
    }

    pub fn key_up(&self, key_code: u32) -> EventResult {
        self.host.dispatch_key(&InputEvent::key_up(key_code))
    }

    pub fn key_down(&self, key_code: u32) -> EventResult {
        self.host.dispatch_key(&InputEvent::key_down(key_code))
    }
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}

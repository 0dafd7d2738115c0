//! Paced render loop over one surface.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use gesso_ui_graphics::Color;

use crate::error::{GessoError, RenderResult};
use crate::frame_clock::{validate_rate, FrameCallbackRegistration, FrameClock};
use crate::surface::{Surface, WeakSurface};

pub const DEFAULT_RATE: f64 = 60.0;

/// User render callback, invoked once per tick.
pub type RenderCallback<S> = Box<dyn FnMut(&mut Frame<'_, S>) -> RenderResult + 'static>;

/// Per-tick view handed to the render callback.
///
/// The surface stays mutably borrowed for the whole tick, so draw through the
/// frame rather than through other handles to the same surface.
pub struct Frame<'a, S: Surface> {
    surface: &'a mut S,
    index: u64,
    time: Duration,
    rate: f64,
    controller: AnimationController<S>,
}

impl<'a, S: Surface + 'static> Frame<'a, S> {
    pub fn surface(&self) -> &S {
        &*self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut *self.surface
    }

    pub fn context(&mut self) -> &mut S::Context {
        self.surface.context()
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    /// Zero-based tick index since the controller was created.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Frame timestamp on the runtime clock.
    pub fn time(&self) -> Duration {
        self.time
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn controller(&self) -> &AnimationController<S> {
        &self.controller
    }

    /// Ends the loop after this tick.
    pub fn stop(&self) {
        self.controller.stop();
    }

    pub fn set_rate(&self, rate: f64) -> Result<(), GessoError> {
        self.controller.set_rate(rate)
    }
}

struct ControllerInner<S: Surface> {
    surface: WeakSurface<S>,
    clock: FrameClock,
    running: Cell<bool>,
    ticking: Cell<bool>,
    rate: Cell<f64>,
    clear_frame: Cell<bool>,
    background: Cell<Option<Color>>,
    frame_count: Cell<u64>,
    render: RefCell<Option<RenderCallback<S>>>,
    render_version: Cell<u64>,
    pending: RefCell<Option<FrameCallbackRegistration>>,
}

impl<S: Surface + 'static> ControllerInner<S> {
    fn cancel_pending(&self) {
        let pending = self.pending.borrow_mut().take();
        drop(pending);
    }

    fn halt(&self) {
        self.running.set(false);
        self.cancel_pending();
    }

    fn tick(this: &Rc<Self>, time: Duration) -> Result<(), GessoError> {
        // The registration that led here has already fired.
        this.cancel_pending();

        let Some(cell) = this.surface.upgrade() else {
            log::warn!("surface dropped, halting animation");
            this.halt();
            return Err(GessoError::SurfaceDetached);
        };

        // Another controller on the same surface may be mid-render.
        let Ok(mut surface) = cell.try_borrow_mut() else {
            log::warn!("surface is busy, halting animation");
            this.halt();
            return Err(GessoError::SurfaceBusy);
        };

        let index = this.frame_count.get();
        this.frame_count.set(index + 1);
        log::trace!("tick {index} at {time:?}");

        this.ticking.set(true);
        if this.clear_frame.get() {
            surface.clear(this.background.get());
        }
        let result = Self::render(this, &mut surface, index, time);
        drop(surface);
        this.ticking.set(false);

        if let Err(source) = result {
            log::warn!("render callback failed on frame {index}: {source}");
            this.halt();
            return Err(GessoError::CallbackFailure {
                frame: index,
                source,
            });
        }

        if this.running.get() {
            Self::schedule_next(this)?;
        }
        Ok(())
    }

    fn render(this: &Rc<Self>, surface: &mut S, index: u64, time: Duration) -> RenderResult {
        let Some(mut callback) = this.render.borrow_mut().take() else {
            return Ok(());
        };
        let version = this.render_version.get();
        let mut frame = Frame {
            surface,
            index,
            time,
            rate: this.rate.get(),
            controller: AnimationController {
                inner: Rc::clone(this),
            },
        };
        let result = callback(&mut frame);
        // Keep the callback unless it replaced or cleared itself.
        if this.render_version.get() == version {
            *this.render.borrow_mut() = Some(callback);
        }
        result
    }

    fn schedule_next(this: &Rc<Self>) -> Result<(), GessoError> {
        let delay = FrameClock::frame_delay(this.rate.get())?;
        let weak: Weak<Self> = Rc::downgrade(this);
        let registration = this.clock.schedule_after(delay, move |nanos| match weak.upgrade() {
            Some(inner) => Self::tick(&inner, Duration::from_nanos(nanos)),
            None => Ok(()),
        });
        if !registration.is_pending() {
            log::debug!("runtime is gone, animation stopped");
            this.running.set(false);
            return Ok(());
        }
        *this.pending.borrow_mut() = Some(registration);
        Ok(())
    }
}

/// Run/stop state machine driving ticks over a surface.
pub struct AnimationController<S: Surface> {
    inner: Rc<ControllerInner<S>>,
}

impl<S: Surface> Clone for AnimationController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: Surface + 'static> AnimationController<S> {
    pub fn new(surface: WeakSurface<S>, clock: FrameClock) -> Self {
        Self {
            inner: Rc::new(ControllerInner {
                surface,
                clock,
                running: Cell::new(false),
                ticking: Cell::new(false),
                rate: Cell::new(DEFAULT_RATE),
                clear_frame: Cell::new(true),
                background: Cell::new(None),
                frame_count: Cell::new(0),
                render: RefCell::new(None),
                render_version: Cell::new(0),
                pending: RefCell::new(None),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakController<S> {
        WeakController(Rc::downgrade(&self.inner))
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Whether a next tick is armed.
    pub fn has_pending_tick(&self) -> bool {
        self.inner
            .pending
            .borrow()
            .as_ref()
            .map_or(false, FrameCallbackRegistration::is_pending)
    }

    /// Starts the loop with one synchronous tick. No-op while running.
    ///
    /// Called from inside a render callback, it only marks the loop as
    /// running; the executing tick then schedules the next one.
    pub fn play(&self) -> Result<(), GessoError> {
        if self.inner.running.get() {
            return Ok(());
        }
        self.inner.running.set(true);
        log::debug!("animation started at {} fps", self.inner.rate.get());
        if self.inner.ticking.get() {
            return Ok(());
        }
        let now = self.inner.clock.runtime_handle().now();
        ControllerInner::tick(&self.inner, now)
    }

    pub fn stop(&self) {
        if self.inner.running.replace(false) {
            log::debug!(
                "animation stopped after {} frames",
                self.inner.frame_count.get()
            );
        }
        self.inner.cancel_pending();
    }

    pub fn toggle_play(&self) -> Result<(), GessoError> {
        if self.is_running() {
            self.stop();
            Ok(())
        } else {
            self.play()
        }
    }

    pub fn rate(&self) -> f64 {
        self.inner.rate.get()
    }

    /// Takes effect at the next scheduling decision.
    pub fn set_rate(&self, rate: f64) -> Result<(), GessoError> {
        validate_rate(rate)?;
        self.inner.rate.set(rate);
        log::debug!("frame rate set to {rate}");
        Ok(())
    }

    pub fn frame_count(&self) -> u64 {
        self.inner.frame_count.get()
    }

    pub fn clear_frame(&self) -> bool {
        self.inner.clear_frame.get()
    }

    pub fn set_clear_frame(&self, clear: bool) {
        self.inner.clear_frame.set(clear);
    }

    pub fn background(&self) -> Option<Color> {
        self.inner.background.get()
    }

    pub fn set_background(&self, background: Option<Color>) {
        self.inner.background.set(background);
    }

    pub fn set_render(&self, callback: impl FnMut(&mut Frame<'_, S>) -> RenderResult + 'static) {
        self.bump_render_version();
        *self.inner.render.borrow_mut() = Some(Box::new(callback));
    }

    pub fn clear_render(&self) {
        self.bump_render_version();
        self.inner.render.borrow_mut().take();
    }

    pub fn has_render(&self) -> bool {
        self.inner.render.borrow().is_some()
    }

    fn bump_render_version(&self) {
        let version = self.inner.render_version.get();
        self.inner.render_version.set(version.wrapping_add(1));
    }
}

impl<S: Surface> fmt::Debug for AnimationController<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationController")
            .field("running", &self.inner.running.get())
            .field("rate", &self.inner.rate.get())
            .field("frame_count", &self.inner.frame_count.get())
            .finish()
    }
}

/// Weak controller reference held by scheduled ticks and toggle listeners.
pub struct WeakController<S: Surface>(Weak<ControllerInner<S>>);

impl<S: Surface> Clone for WeakController<S> {
    fn clone(&self) -> Self {
        Self(Weak::clone(&self.0))
    }
}

impl<S: Surface> WeakController<S> {
    pub fn upgrade(&self) -> Option<AnimationController<S>> {
        self.0.upgrade().map(|inner| AnimationController { inner })
    }
}

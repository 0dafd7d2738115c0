//! One prepared surface: its animation loop and its event bindings.

use std::fmt;

use gesso_ui_graphics::{Color, ColorParseError, Point};

use crate::config::GessoConfig;
use crate::controller::{AnimationController, Frame};
use crate::error::{GessoError, RenderResult};
use crate::events::{Document, EventName, EventResult, EventRouter, Listener, ListenerHandle};
use crate::host::Host;
use crate::runtime::Runtime;
use crate::surface::{
    resolve_surface, Surface, SurfaceHandle, SurfaceOptions, SurfaceProvider, SurfaceRef,
};

pub struct Gesso<S: Surface> {
    surface: SurfaceHandle<S>,
    position: Point,
    controller: AnimationController<S>,
    router: EventRouter,
}

impl<S: Surface + 'static> Gesso<S> {
    /// Creates a new surface through the host's provider and prepares it.
    pub fn create<P>(host: &mut Host<P>, options: &SurfaceOptions) -> Result<Self, GessoError>
    where
        P: SurfaceProvider<Surface = S>,
    {
        let surface = host.provider_mut().create_surface(options)?;
        Ok(Self::prepare(host, surface, options.position()))
    }

    /// Prepares an existing drawable, by id or by element.
    pub fn attach<P>(host: &Host<P>, reference: impl Into<SurfaceRef<S>>) -> Result<Self, GessoError>
    where
        P: SurfaceProvider<Surface = S>,
    {
        let surface = resolve_surface(host.provider(), reference.into())?;
        let position = host.provider().position_of(&surface).unwrap_or(Point::ZERO);
        log::debug!(
            "attached to surface {}x{}",
            surface.borrow().width(),
            surface.borrow().height()
        );
        Ok(Self::prepare(host, surface, position))
    }

    fn prepare<P>(host: &Host<P>, surface: SurfaceHandle<S>, position: Point) -> Self
    where
        P: SurfaceProvider<Surface = S>,
    {
        Self::with_runtime(surface, position, host.runtime(), host.document().clone())
    }

    fn with_runtime(
        surface: SurfaceHandle<S>,
        position: Point,
        runtime: &Runtime,
        document: Document,
    ) -> Self {
        let controller = AnimationController::new(surface.downgrade(), runtime.frame_clock());
        let weak = controller.downgrade();
        let toggle = Listener::new(move |_| match weak.upgrade() {
            Some(controller) => controller.toggle_play(),
            None => Ok(()),
        });
        let router = EventRouter::new(document, surface.listeners().clone(), toggle);
        Self {
            surface,
            position,
            controller,
            router,
        }
    }

    pub fn surface(&self) -> &SurfaceHandle<S> {
        &self.surface
    }

    pub fn controller(&self) -> &AnimationController<S> {
        &self.controller
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn width(&self) -> u32 {
        self.surface.borrow().width()
    }

    pub fn height(&self) -> u32 {
        self.surface.borrow().height()
    }

    pub fn set_size(&self, width: u32, height: u32) {
        self.surface.borrow_mut().resize(width, height);
    }

    /// Clears to the background color, or to transparent when none is set.
    pub fn clear(&self) {
        let background = self.controller.background();
        self.surface.borrow_mut().clear(background);
    }

    pub fn on_render(&self, callback: impl FnMut(&mut Frame<'_, S>) -> RenderResult + 'static) {
        self.controller.set_render(callback);
    }

    pub fn fps(&self) -> f64 {
        self.controller.rate()
    }

    pub fn set_fps(&self, fps: f64) -> Result<(), GessoError> {
        self.controller.set_rate(fps)
    }

    pub fn clear_frame(&self) -> bool {
        self.controller.clear_frame()
    }

    pub fn set_clear_frame(&self, clear: bool) {
        self.controller.set_clear_frame(clear);
    }

    pub fn background_color(&self) -> Option<Color> {
        self.controller.background()
    }

    pub fn set_background_color(&self, color: impl Into<Option<Color>>) {
        self.controller.set_background(color.into());
    }

    /// Sets the background from a CSS color name or hex string.
    pub fn set_background_css(&self, css: &str) -> Result<(), ColorParseError> {
        let color: Color = css.parse()?;
        self.controller.set_background(Some(color));
        Ok(())
    }

    pub fn apply_config(&self, config: &GessoConfig) -> Result<(), GessoError> {
        config.validate()?;
        self.controller.set_rate(config.fps)?;
        self.controller.set_clear_frame(config.clear_frame);
        self.controller.set_background(config.background);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    pub fn play(&self) -> Result<(), GessoError> {
        self.controller.play()
    }

    pub fn stop(&self) {
        self.controller.stop();
    }

    pub fn toggle_play(&self) -> Result<(), GessoError> {
        self.controller.toggle_play()
    }

    pub fn on(&self, name: impl Into<EventName>, listener: &Listener) -> ListenerHandle {
        self.router.on(name, listener)
    }

    pub fn off(&self, name: impl Into<EventName>, listener: &Listener) {
        self.router.off(name, listener);
    }

    pub fn keyup(
        &self,
        key_code: u32,
        callback: impl Fn() -> EventResult + 'static,
    ) -> ListenerHandle {
        self.router.keyup(key_code, callback)
    }

    pub fn keydown(
        &self,
        key_code: u32,
        callback: impl Fn() -> EventResult + 'static,
    ) -> ListenerHandle {
        self.router.keydown(key_code, callback)
    }

    pub fn toggle_play_on_click(&self, enabled: bool) {
        self.router.toggle_play_on_click(enabled);
    }

    pub fn toggle_play_on_space(&self, enabled: bool) {
        self.router.toggle_play_on_space(enabled);
    }
}

impl<S: Surface> Drop for Gesso<S> {
    fn drop(&mut self) {
        self.router.toggle_play_on_click(false);
        self.router.toggle_play_on_space(false);
    }
}

impl<S: Surface> fmt::Debug for Gesso<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gesso")
            .field("surface", &self.surface)
            .field("position", &self.position)
            .field("controller", &self.controller)
            .finish()
    }
}

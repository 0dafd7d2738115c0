#![deny(missing_docs)]

//! High level utilities for running Gesso surfaces in a desktop window with
//! minimal boilerplate.

#[cfg(not(feature = "desktop"))]
compile_error!("gesso-app must be built with the `desktop` feature enabled.");

#[cfg(not(feature = "renderer-pixels"))]
compile_error!("gesso-app currently requires the `renderer-pixels` feature.");

use std::time::Instant;

use gesso_core::{GessoError, Host, Size};
use gesso_platform_desktop_winit::DesktopWinitPlatform;
use gesso_render_pixels::PixelHost;
use gesso_runtime_std::StdRuntime;
use pixels::{Pixels, SurfaceTexture};
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{Event, StartCause, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder};
use winit::window::WindowBuilder;

/// Host type handed to the setup closure.
pub type DesktopHost = Host<PixelHost>;

/// Builder used to configure and launch a Gesso application.
#[derive(Debug, Clone, Default)]
pub struct GessoAppBuilder {
    options: GessoAppOptions,
}

impl GessoAppBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the window title for the application.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.options.title = title.into();
        self
    }

    /// Sets the initial logical size of the application window.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.options.initial_size = (width, height);
        self
    }

    /// Opens the window, runs `setup` once against the host and drives the
    /// event loop forever. Whatever `setup` returns is kept alive for the
    /// lifetime of the loop.
    pub fn run<T: 'static>(
        self,
        setup: impl FnOnce(&mut DesktopHost) -> Result<T, GessoError>,
    ) -> ! {
        run_pixels_app(&self.options, setup)
    }
}

/// Options used to configure the application window.
#[derive(Debug, Clone)]
pub struct GessoAppOptions {
    title: String,
    initial_size: (u32, u32),
}

impl Default for GessoAppOptions {
    fn default() -> Self {
        Self {
            title: "Gesso".to_string(),
            initial_size: (800, 600),
        }
    }
}

impl GessoAppOptions {
    /// Sets the title used for the application window.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the initial window size in logical pixels.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.initial_size = (width, height);
        self
    }
}

/// Launches a Gesso application using the provided options.
pub fn gesso_app_with_options<T: 'static>(
    options: GessoAppOptions,
    setup: impl FnOnce(&mut DesktopHost) -> Result<T, GessoError>,
) -> ! {
    run_pixels_app(&options, setup)
}

fn logical_size(physical: PhysicalSize<u32>, scale_factor: f64) -> Size {
    let logical: LogicalSize<u32> = physical.to_logical(scale_factor);
    Size::new(logical.width.max(1), logical.height.max(1))
}

fn report(result: Result<(), GessoError>) {
    if let Err(err) = result {
        log::error!("{err}");
    }
}

fn run_pixels_app<T: 'static>(
    options: &GessoAppOptions,
    setup: impl FnOnce(&mut DesktopHost) -> Result<T, GessoError>,
) -> ! {
    let event_loop = EventLoopBuilder::<()>::with_user_event().build();
    let frame_proxy = event_loop.create_proxy();

    let (initial_width, initial_height) = options.initial_size;
    let window = WindowBuilder::new()
        .with_title(options.title.clone())
        .with_inner_size(LogicalSize::new(
            initial_width as f64,
            initial_height as f64,
        ))
        .build(&event_loop)
        .expect("failed to create window");

    let mut platform = DesktopWinitPlatform::default();
    platform.set_scale_factor(window.scale_factor());

    let physical = window.inner_size();
    let mut buffer_size = logical_size(physical, platform.scale_factor());
    let surface_texture = SurfaceTexture::new(physical.width, physical.height, &window);
    let mut pixels = Pixels::new(buffer_size.width, buffer_size.height, surface_texture)
        .expect("failed to create pixel buffer");

    let runtime = StdRuntime::new();
    runtime.set_frame_waker({
        let proxy = frame_proxy.clone();
        move || {
            let _ = proxy.send_event(());
        }
    });

    let mut host = Host::new(PixelHost::new(buffer_size), runtime.runtime());
    let app_state = match setup(&mut host) {
        Ok(state) => state,
        Err(err) => {
            log::error!("application setup failed: {err}");
            std::process::exit(1);
        }
    };
    window.request_redraw();

    event_loop.run(move |event, _, control_flow| {
        let _keep_alive = &app_state;
        match event {
            Event::NewEvents(StartCause::Init) => {}
            Event::NewEvents(_) | Event::UserEvent(()) => {
                report(runtime.runtime().run_due_timers());
            }
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    *control_flow = ControlFlow::Exit;
                    return;
                }
                WindowEvent::Resized(new_size) => {
                    buffer_size = logical_size(new_size, platform.scale_factor());
                    if let Err(err) = pixels.resize_surface(new_size.width, new_size.height) {
                        log::error!("failed to resize surface: {err}");
                        *control_flow = ControlFlow::Exit;
                        return;
                    }
                    if let Err(err) = pixels.resize_buffer(buffer_size.width, buffer_size.height) {
                        log::error!("failed to resize buffer: {err}");
                        *control_flow = ControlFlow::Exit;
                        return;
                    }
                    host.provider_mut().set_viewport(buffer_size);
                    window.request_redraw();
                }
                WindowEvent::ScaleFactorChanged {
                    scale_factor,
                    new_inner_size,
                    ..
                } => {
                    platform.set_scale_factor(scale_factor);
                    buffer_size = logical_size(*new_inner_size, scale_factor);
                    if let Err(err) =
                        pixels.resize_surface(new_inner_size.width, new_inner_size.height)
                    {
                        log::error!("failed to resize surface: {err}");
                        *control_flow = ControlFlow::Exit;
                        return;
                    }
                    if let Err(err) = pixels.resize_buffer(buffer_size.width, buffer_size.height) {
                        log::error!("failed to resize buffer: {err}");
                        *control_flow = ControlFlow::Exit;
                        return;
                    }
                    host.provider_mut().set_viewport(buffer_size);
                    window.request_redraw();
                }
                WindowEvent::CursorMoved { position, .. } => {
                    let logical = platform.set_cursor(position);
                    report(host.dispatch_pointer(gesso_core::EventName::MouseMove, logical));
                    window.request_redraw();
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    for name in platform.mouse_events(state, button) {
                        report(host.dispatch_pointer(name, platform.cursor()));
                    }
                    window.request_redraw();
                }
                WindowEvent::KeyboardInput { input, .. } => {
                    if let Some(key_event) = platform.keyboard_event(&input) {
                        report(host.dispatch_key(&key_event));
                        window.request_redraw();
                    }
                }
                _ => {}
            },
            Event::MainEventsCleared => {
                if runtime.runtime().needs_frame() {
                    window.request_redraw();
                }
            }
            Event::RedrawRequested(_) => {
                if runtime.take_frame_request() || runtime.runtime().needs_frame() {
                    let now = runtime.now().as_nanos() as u64;
                    report(runtime.drain_frame_callbacks(now));
                }
                host.provider()
                    .composite(pixels.frame_mut(), buffer_size.width, buffer_size.height);
                if let Err(err) = pixels.render() {
                    log::error!("pixels render failed: {err}");
                    *control_flow = ControlFlow::Exit;
                    return;
                }
            }
            _ => {}
        }

        *control_flow = match runtime.next_wakeup() {
            Some(deadline) if deadline <= Instant::now() => ControlFlow::Poll,
            Some(deadline) => ControlFlow::WaitUntil(deadline),
            None => ControlFlow::Wait,
        };
    });
}

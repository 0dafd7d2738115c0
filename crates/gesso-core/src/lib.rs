#![doc = r"Animation loop, frame pacing and event routing for Gesso-RS surfaces."]

pub mod collections;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod frame_clock;
pub mod gesso;
pub mod host;
pub mod platform;
pub mod runtime;
pub mod surface;

pub use config::GessoConfig;
pub use controller::{AnimationController, Frame, RenderCallback, WeakController, DEFAULT_RATE};
pub use error::{GessoError, RenderError, RenderResult};
pub use events::{
    dispatch_to_surface, Document, EventName, EventResult, EventRouter, InputEvent, Listener,
    ListenerHandle, ListenerTable, SPACE_KEY,
};
pub use frame_clock::{FrameCallbackRegistration, FrameClock};
pub use gesso::Gesso;
pub use gesso_ui_graphics::{Color, ColorParseError, Point, Rect, Size};
pub use host::Host;
pub use platform::{Clock, RuntimeScheduler};
pub use runtime::{FrameCallbackId, Runtime, RuntimeHandle, TaskResult, TimerId};
pub use surface::{
    resolve_surface, Element, Placement, Surface, SurfaceHandle, SurfaceOptions, SurfaceProvider,
    SurfaceRef, SurfaceRegistry, WeakSurface, ROOT_CONTAINER,
};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod lib_tests;

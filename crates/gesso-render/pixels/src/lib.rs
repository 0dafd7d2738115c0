//! RGBA framebuffer surfaces for Gesso-RS, composited into a `pixels` window
//! by `gesso-app`.

mod canvas;
mod host;
mod surface;

pub use canvas::PixelCanvas;
pub use host::{PixelHost, PAGE_COLOR};
pub use surface::PixelSurface;

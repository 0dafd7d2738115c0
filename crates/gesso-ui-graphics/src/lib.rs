//! Pure math/data for drawing surfaces in Gesso-RS
//!
//! This crate contains the color and geometry primitives shared by the
//! animation core and the surface backends.

mod color;
mod geometry;

pub use color::*;
pub use geometry::*;

pub mod prelude {
    pub use crate::color::Color;
    pub use crate::geometry::{Point, Rect, Size};
}

use gesso_core::Surface;
use gesso_ui_graphics::{Color, Size};

/// Size-affecting or clearing operation observed by a [`MemorySurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceOp {
    Clear(Option<Color>),
    Resize(Size),
}

/// Surface that records operations instead of drawing.
///
/// Its context is a plain log that render callbacks can push to.
#[derive(Clone, Debug, Default)]
pub struct MemorySurface {
    size: Size,
    ops: Vec<SurfaceOp>,
    drawn: Vec<String>,
}

impl MemorySurface {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    pub fn clear_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, SurfaceOp::Clear(_)))
            .count()
    }

    /// Fill used by the most recent clear; `Some(None)` for a transparent clear.
    pub fn last_clear(&self) -> Option<Option<Color>> {
        self.ops.iter().rev().find_map(|op| match op {
            SurfaceOp::Clear(fill) => Some(*fill),
            SurfaceOp::Resize(_) => None,
        })
    }

    pub fn drawn(&self) -> &[String] {
        &self.drawn
    }
}

impl Surface for MemorySurface {
    type Context = Vec<String>;

    fn width(&self) -> u32 {
        self.size.width
    }

    fn height(&self) -> u32 {
        self.size.height
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = Size::new(width, height);
        self.ops.push(SurfaceOp::Resize(self.size));
    }

    fn clear(&mut self, fill: Option<Color>) {
        self.ops.push(SurfaceOp::Clear(fill));
    }

    fn context(&mut self) -> &mut Vec<String> {
        &mut self.drawn
    }
}

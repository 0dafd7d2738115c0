use gesso_core::Surface;
use gesso_ui_graphics::{Color, Size};

use crate::canvas::PixelCanvas;

/// Framebuffer-backed drawable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PixelSurface {
    canvas: PixelCanvas,
}

impl PixelSurface {
    pub fn new(size: Size) -> Self {
        Self {
            canvas: PixelCanvas::new(size),
        }
    }

    pub fn canvas(&self) -> &PixelCanvas {
        &self.canvas
    }
}

impl Surface for PixelSurface {
    type Context = PixelCanvas;

    fn width(&self) -> u32 {
        self.canvas.width()
    }

    fn height(&self) -> u32 {
        self.canvas.height()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.canvas.resize(Size::new(width, height));
    }

    fn clear(&mut self, fill: Option<Color>) {
        match fill {
            Some(color) => self.canvas.fill(color),
            None => self.canvas.clear_transparent(),
        }
    }

    fn context(&mut self) -> &mut PixelCanvas {
        &mut self.canvas
    }
}

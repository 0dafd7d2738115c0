use gesso_ui_graphics::{Color, Point, Rect, Size};

const BYTES_PER_PIXEL: usize = 4;

/// RGBA8 pixel buffer with a few immediate-mode drawing helpers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PixelCanvas {
    size: Size,
    pixels: Vec<u8>,
}

impl PixelCanvas {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            pixels: vec![0; size.area() * BYTES_PER_PIXEL],
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Reallocates the buffer; the new contents are transparent.
    pub fn resize(&mut self, size: Size) {
        self.size = size;
        self.pixels.clear();
        self.pixels.resize(size.area() * BYTES_PER_PIXEL, 0);
    }

    pub fn frame(&self) -> &[u8] {
        &self.pixels
    }

    pub fn frame_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    fn offset(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.size.width as i64 || y >= self.size.height as i64 {
            return None;
        }
        Some((y as usize * self.size.width as usize + x as usize) * BYTES_PER_PIXEL)
    }

    pub fn pixel(&self, x: i64, y: i64) -> Option<Color> {
        let offset = self.offset(x, y)?;
        let rgba = &self.pixels[offset..offset + BYTES_PER_PIXEL];
        Some(Color::rgba(rgba[0], rgba[1], rgba[2], rgba[3]))
    }

    /// Overwrites one pixel; out-of-bounds writes are dropped.
    pub fn put_pixel(&mut self, x: i64, y: i64, color: Color) {
        if let Some(offset) = self.offset(x, y) {
            self.pixels[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&color.to_array());
        }
    }

    /// Composites `color` over one pixel.
    pub fn blend_pixel(&mut self, x: i64, y: i64, color: Color) {
        if let Some(existing) = self.pixel(x, y) {
            self.put_pixel(x, y, color.over(existing));
        }
    }

    pub fn clear_transparent(&mut self) {
        self.pixels.fill(0);
    }

    /// Paints `color` over every pixel.
    pub fn fill(&mut self, color: Color) {
        if color.is_opaque() {
            let rgba = color.to_array();
            for pixel in self.pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
                pixel.copy_from_slice(&rgba);
            }
            return;
        }
        for pixel in self.pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            let existing = Color::rgba(pixel[0], pixel[1], pixel[2], pixel[3]);
            pixel.copy_from_slice(&color.over(existing).to_array());
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let x0 = rect.x.floor() as i64;
        let y0 = rect.y.floor() as i64;
        let x1 = (rect.x + rect.width).ceil() as i64;
        let y1 = (rect.y + rect.height).ceil() as i64;
        for y in y0.max(0)..y1.min(self.size.height as i64) {
            for x in x0.max(0)..x1.min(self.size.width as i64) {
                self.blend_pixel(x, y, color);
            }
        }
    }

    /// One-pixel line between two points.
    pub fn draw_line(&mut self, from: Point, to: Point, color: Color) {
        let (mut x, mut y) = (from.x.round() as i64, from.y.round() as i64);
        let (x_end, y_end) = (to.x.round() as i64, to.y.round() as i64);
        let dx = (x_end - x).abs();
        let dy = -(y_end - y).abs();
        let step_x = if x < x_end { 1 } else { -1 };
        let step_y = if y < y_end { 1 } else { -1 };
        let mut error = dx + dy;
        loop {
            self.blend_pixel(x, y, color);
            if x == x_end && y == y_end {
                break;
            }
            let doubled = 2 * error;
            if doubled >= dy {
                error += dy;
                x += step_x;
            }
            if doubled <= dx {
                error += dx;
                y += step_y;
            }
        }
    }

    /// Connects consecutive points with lines.
    pub fn stroke_polyline(&mut self, points: &[Point], color: Color) {
        for pair in points.windows(2) {
            self.draw_line(pair[0], pair[1], color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_and_read_back() {
        let mut canvas = PixelCanvas::new(Size::new(4, 3));
        canvas.put_pixel(3, 2, Color::WHITE);
        canvas.put_pixel(4, 0, Color::WHITE);
        canvas.put_pixel(-1, 0, Color::WHITE);
        assert_eq!(canvas.pixel(3, 2), Some(Color::WHITE));
        assert_eq!(canvas.pixel(0, 0), Some(Color::TRANSPARENT));
        assert_eq!(canvas.pixel(4, 0), None);
        assert_eq!(canvas.frame().len(), 4 * 3 * 4);
    }

    #[test]
    fn blend_composites_source_over() {
        let mut canvas = PixelCanvas::new(Size::new(1, 1));
        canvas.fill(Color::WHITE);
        canvas.blend_pixel(0, 0, Color::rgba(0, 0, 0, 0));
        assert_eq!(canvas.pixel(0, 0), Some(Color::WHITE));
        canvas.blend_pixel(0, 0, Color::rgba(0, 0, 0, 255));
        assert_eq!(canvas.pixel(0, 0), Some(Color::BLACK));
    }

    #[test]
    fn horizontal_and_diagonal_lines_cover_expected_pixels() {
        let mut canvas = PixelCanvas::new(Size::new(5, 5));
        canvas.draw_line(Point::new(0.0, 0.0), Point::new(4.0, 0.0), Color::BLACK);
        canvas.draw_line(Point::new(0.0, 1.0), Point::new(3.0, 4.0), Color::WHITE);
        for x in 0..5 {
            assert_eq!(canvas.pixel(x, 0), Some(Color::BLACK));
        }
        for step in 0..4 {
            assert_eq!(canvas.pixel(step, 1 + step), Some(Color::WHITE));
        }
        assert_eq!(canvas.pixel(4, 4), Some(Color::TRANSPARENT));
    }

    #[test]
    fn fill_rect_clips_to_canvas() {
        let mut canvas = PixelCanvas::new(Size::new(3, 3));
        canvas.fill_rect(Rect::new(1.0, 1.0, 10.0, 10.0), Color::LIGHT_BLUE);
        assert_eq!(canvas.pixel(0, 0), Some(Color::TRANSPARENT));
        assert_eq!(canvas.pixel(2, 2), Some(Color::LIGHT_BLUE));
    }

    #[test]
    fn resize_resets_contents() {
        let mut canvas = PixelCanvas::new(Size::new(2, 2));
        canvas.fill(Color::WHITE);
        canvas.resize(Size::new(3, 1));
        assert_eq!(canvas.frame(), &[0u8; 12][..]);
    }
}

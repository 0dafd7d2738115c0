use gesso_core::{Element, GessoError, SurfaceHandle, SurfaceOptions, SurfaceProvider, SurfaceRegistry};
use gesso_ui_graphics::{Color, Point, Size};

use crate::surface::PixelSurface;

/// Page color behind every surface.
pub const PAGE_COLOR: Color = Color::WHITE;

/// Surface provider for a single window: surfaces are stacked in creation
/// order and composited into the window framebuffer.
pub struct PixelHost {
    registry: SurfaceRegistry<PixelSurface>,
}

impl PixelHost {
    pub fn new(viewport: Size) -> Self {
        Self {
            registry: SurfaceRegistry::new(viewport, PixelSurface::new),
        }
    }

    pub fn registry(&self) -> &SurfaceRegistry<PixelSurface> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SurfaceRegistry<PixelSurface> {
        &mut self.registry
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        log::debug!("viewport is now {}x{}", viewport.width, viewport.height);
        self.registry.set_viewport(viewport);
    }

    /// Paints the page color, then every placed surface bottom to top.
    pub fn composite(&self, frame: &mut [u8], width: u32, height: u32) {
        let page = PAGE_COLOR.to_array();
        for pixel in frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&page);
        }
        for (handle, placement) in self.registry.placed() {
            let surface = handle.borrow();
            blit(
                frame,
                Size::new(width, height),
                surface.canvas().frame(),
                surface.canvas().size(),
                placement.position,
            );
        }
    }
}

fn blit(frame: &mut [u8], frame_size: Size, source: &[u8], source_size: Size, at: Point) {
    let origin_x = at.x.round() as i64;
    let origin_y = at.y.round() as i64;
    for row in 0..source_size.height as i64 {
        let y = origin_y + row;
        if y < 0 || y >= frame_size.height as i64 {
            continue;
        }
        for column in 0..source_size.width as i64 {
            let x = origin_x + column;
            if x < 0 || x >= frame_size.width as i64 {
                continue;
            }
            let src = ((row * source_size.width as i64 + column) * 4) as usize;
            let dst = ((y * frame_size.width as i64 + x) * 4) as usize;
            let (Some(src_px), Some(dst_px)) = (source.get(src..src + 4), frame.get(dst..dst + 4))
            else {
                continue;
            };
            let src_color = Color::rgba(src_px[0], src_px[1], src_px[2], src_px[3]);
            let dst_color = Color::rgba(dst_px[0], dst_px[1], dst_px[2], dst_px[3]);
            let out = src_color.over(dst_color).to_array();
            frame[dst..dst + 4].copy_from_slice(&out);
        }
    }
}

impl SurfaceProvider for PixelHost {
    type Surface = PixelSurface;

    fn create_surface(
        &mut self,
        options: &SurfaceOptions,
    ) -> Result<SurfaceHandle<PixelSurface>, GessoError> {
        self.registry.create_surface(options)
    }

    fn lookup(&self, id: &str) -> Option<Element<PixelSurface>> {
        self.registry.lookup(id)
    }

    fn viewport_size(&self) -> Size {
        self.registry.viewport_size()
    }

    fn position_of(&self, surface: &SurfaceHandle<PixelSurface>) -> Option<Point> {
        self.registry.position_of(surface)
    }

    fn surface_at(&self, point: Point) -> Option<(SurfaceHandle<PixelSurface>, Point)> {
        self.registry.surface_at(point)
    }
}

#[cfg(test)]
mod tests {
    use gesso_core::Surface;

    use super::*;

    fn pixel(frame: &[u8], width: u32, x: u32, y: u32) -> Color {
        let offset = ((y * width + x) * 4) as usize;
        Color::rgba(
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        )
    }

    #[test]
    fn composite_places_surfaces_over_the_page() {
        let mut host = PixelHost::new(Size::new(8, 8));
        let surface = host
            .create_surface(&SurfaceOptions::new().at(2.0, 3.0).with_size(2, 2))
            .unwrap();
        surface.borrow_mut().clear(Some(Color::LIGHT_BLUE));

        let mut frame = vec![0u8; 8 * 8 * 4];
        host.composite(&mut frame, 8, 8);
        assert_eq!(pixel(&frame, 8, 0, 0), PAGE_COLOR);
        assert_eq!(pixel(&frame, 8, 2, 3), Color::LIGHT_BLUE);
        assert_eq!(pixel(&frame, 8, 3, 4), Color::LIGHT_BLUE);
        assert_eq!(pixel(&frame, 8, 4, 4), PAGE_COLOR);
    }

    #[test]
    fn transparent_surface_shows_the_page_and_later_surfaces_win() {
        let mut host = PixelHost::new(Size::new(4, 4));
        let _clear = host.create_surface(&SurfaceOptions::new()).unwrap();
        let top = host
            .create_surface(&SurfaceOptions::new().with_size(1, 1))
            .unwrap();
        top.borrow_mut().clear(Some(Color::BLACK));

        let mut frame = vec![0u8; 4 * 4 * 4];
        host.composite(&mut frame, 4, 4);
        assert_eq!(pixel(&frame, 4, 0, 0), Color::BLACK);
        assert_eq!(pixel(&frame, 4, 1, 1), PAGE_COLOR);
    }

    #[test]
    fn surfaces_partly_off_screen_are_clipped() {
        let mut host = PixelHost::new(Size::new(4, 4));
        let surface = host
            .create_surface(&SurfaceOptions::new().at(-1.0, 3.0).with_size(3, 3))
            .unwrap();
        surface.borrow_mut().clear(Some(Color::BLACK));
        let mut frame = vec![0u8; 4 * 4 * 4];
        host.composite(&mut frame, 4, 4);
        assert_eq!(pixel(&frame, 4, 0, 3), Color::BLACK);
        assert_eq!(pixel(&frame, 4, 1, 3), Color::BLACK);
        assert_eq!(pixel(&frame, 4, 2, 3), PAGE_COLOR);
    }

    #[test]
    fn pointer_lookup_uses_the_registry() {
        let mut host = PixelHost::new(Size::new(10, 10));
        let surface = host
            .create_surface(&SurfaceOptions::new().at(5.0, 5.0).with_size(5, 5))
            .unwrap();
        let (hit, local) = host.surface_at(Point::new(6.0, 7.0)).unwrap();
        assert!(hit.ptr_eq(&surface));
        assert_eq!(local, Point::new(1.0, 2.0));
        assert_eq!(host.position_of(&surface), Some(Point::new(5.0, 5.0)));
    }
}

use gesso_app::GessoAppBuilder;
use gesso_core::{Color, Gesso, Point, SurfaceOptions};
use gesso_render_pixels::PixelSurface;

const INITIAL_WIDTH: u32 = 800;
const INITIAL_HEIGHT: u32 = 600;

fn main() {
    env_logger::init();

    GessoAppBuilder::new()
        .title("Gesso sine wave")
        .size(INITIAL_WIDTH, INITIAL_HEIGHT)
        .run(|host| {
            let gesso: Gesso<PixelSurface> = Gesso::create(host, &SurfaceOptions::new())?;
            if let Err(err) = gesso.set_background_css("lightblue") {
                log::warn!("{err}");
            }
            gesso.set_fps(30.0)?;

            let mut offset = 0.0f32;
            gesso.on_render(move |frame| {
                let width = frame.width();
                let height = frame.height() as f32;
                let points: Vec<Point> = (0..width)
                    .map(|x| {
                        let x = x as f32;
                        let y = height / 2.0 - (x * 0.01).sin() * height * 0.3
                            + (x * 0.2 + offset).cos() * 40.0;
                        Point::new(x, y)
                    })
                    .collect();
                frame.context().stroke_polyline(&points, Color::BLACK);
                offset -= 0.5;
                Ok(())
            });

            gesso.play()?;
            gesso.toggle_play_on_click(true);
            gesso.toggle_play_on_space(true);
            log::info!("click or press space to pause");
            Ok(gesso)
        })
}

use gesso_ui_graphics::Color;

use crate::controller::DEFAULT_RATE;
use crate::error::GessoError;
use crate::frame_clock::validate_rate;

/// Loop settings applied to a [`Gesso`](crate::Gesso) in one go.
#[derive(Clone, Debug, PartialEq)]
pub struct GessoConfig {
    pub fps: f64,
    pub clear_frame: bool,
    pub background: Option<Color>,
}

impl Default for GessoConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_RATE,
            clear_frame: true,
            background: None,
        }
    }
}

impl GessoConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_clear_frame(mut self, clear_frame: bool) -> Self {
        self.clear_frame = clear_frame;
        self
    }

    pub fn with_background(mut self, background: impl Into<Option<Color>>) -> Self {
        self.background = background.into();
        self
    }

    pub fn validate(&self) -> Result<(), GessoError> {
        validate_rate(self.fps)
    }
}

use std::fmt;
use std::str::FromStr;

/// Straight (non-premultiplied) RGBA color with 8 bits per channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const LIGHT_BLUE: Color = Color::rgb(173, 216, 230);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_opaque(&self) -> bool {
        self.a == u8::MAX
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(rgba: [u8; 4]) -> Self {
        Self::rgba(rgba[0], rgba[1], rgba[2], rgba[3])
    }

    /// Composites `self` over `dst` using the source-over operator.
    pub fn over(self, dst: Color) -> Color {
        match self.a {
            255 => return self,
            0 => return dst,
            _ => {}
        }
        let src_a = self.a as u32;
        let dst_a = dst.a as u32 * (255 - src_a) / 255;
        let out_a = src_a + dst_a;
        if out_a == 0 {
            return Color::TRANSPARENT;
        }
        let channel = |s: u8, d: u8| ((s as u32 * src_a + d as u32 * dst_a) / out_a) as u8;
        Color::rgba(
            channel(self.r, dst.r),
            channel(self.g, dst.g),
            channel(self.b, dst.b),
            out_a as u8,
        )
    }

    /// Looks up a CSS named color, ignoring ASCII case.
    pub fn named(name: &str) -> Option<Color> {
        let lower = name.to_ascii_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(candidate, _)| *candidate == lower)
            .map(|(_, color)| *color)
    }

    fn from_hex(digits: &str) -> Option<Color> {
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let nibble = |index: usize| u8::from_str_radix(&digits[index..=index], 16).ok();
        let byte = |index: usize| u8::from_str_radix(&digits[index..index + 2], 16).ok();
        match digits.len() {
            3 | 4 => {
                let mut channels = [255u8; 4];
                for (slot, index) in channels.iter_mut().zip(0..digits.len()) {
                    *slot = nibble(index)? * 17;
                }
                Some(Color::from_array(channels))
            }
            6 | 8 => {
                let mut channels = [255u8; 4];
                for (slot, index) in channels.iter_mut().zip((0..digits.len()).step_by(2)) {
                    *slot = byte(index)?;
                }
                Some(Color::from_array(channels))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_opaque() {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorParseError {
    input: String,
}

impl ColorParseError {
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a recognised color", self.input)
    }
}

impl std::error::Error for ColorParseError {}

impl FromStr for Color {
    type Err = ColorParseError;

    /// Accepts CSS color names and `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed.strip_prefix('#') {
            Some(digits) => Color::from_hex(digits),
            None => Color::named(trimmed),
        };
        parsed.ok_or_else(|| ColorParseError {
            input: s.to_string(),
        })
    }
}

const NAMED_COLORS: &[(&str, Color)] = &[
    ("transparent", Color::TRANSPARENT),
    ("black", Color::BLACK),
    ("white", Color::WHITE),
    ("red", Color::rgb(255, 0, 0)),
    ("green", Color::rgb(0, 128, 0)),
    ("lime", Color::rgb(0, 255, 0)),
    ("blue", Color::rgb(0, 0, 255)),
    ("yellow", Color::rgb(255, 255, 0)),
    ("cyan", Color::rgb(0, 255, 255)),
    ("aqua", Color::rgb(0, 255, 255)),
    ("magenta", Color::rgb(255, 0, 255)),
    ("fuchsia", Color::rgb(255, 0, 255)),
    ("silver", Color::rgb(192, 192, 192)),
    ("gray", Color::rgb(128, 128, 128)),
    ("grey", Color::rgb(128, 128, 128)),
    ("darkgray", Color::rgb(169, 169, 169)),
    ("lightgray", Color::rgb(211, 211, 211)),
    ("maroon", Color::rgb(128, 0, 0)),
    ("olive", Color::rgb(128, 128, 0)),
    ("purple", Color::rgb(128, 0, 128)),
    ("teal", Color::rgb(0, 128, 128)),
    ("navy", Color::rgb(0, 0, 128)),
    ("orange", Color::rgb(255, 165, 0)),
    ("pink", Color::rgb(255, 192, 203)),
    ("brown", Color::rgb(165, 42, 42)),
    ("gold", Color::rgb(255, 215, 0)),
    ("coral", Color::rgb(255, 127, 80)),
    ("salmon", Color::rgb(250, 128, 114)),
    ("tomato", Color::rgb(255, 99, 71)),
    ("crimson", Color::rgb(220, 20, 60)),
    ("indigo", Color::rgb(75, 0, 130)),
    ("violet", Color::rgb(238, 130, 238)),
    ("orchid", Color::rgb(218, 112, 214)),
    ("plum", Color::rgb(221, 160, 221)),
    ("khaki", Color::rgb(240, 230, 140)),
    ("beige", Color::rgb(245, 245, 220)),
    ("ivory", Color::rgb(255, 255, 240)),
    ("lavender", Color::rgb(230, 230, 250)),
    ("skyblue", Color::rgb(135, 206, 235)),
    ("lightblue", Color::LIGHT_BLUE),
    ("steelblue", Color::rgb(70, 130, 180)),
    ("royalblue", Color::rgb(65, 105, 225)),
    ("cornflowerblue", Color::rgb(100, 149, 237)),
    ("darkblue", Color::rgb(0, 0, 139)),
    ("lightgreen", Color::rgb(144, 238, 144)),
    ("darkgreen", Color::rgb(0, 100, 0)),
    ("forestgreen", Color::rgb(34, 139, 34)),
    ("seagreen", Color::rgb(46, 139, 87)),
    ("turquoise", Color::rgb(64, 224, 208)),
    ("slategray", Color::rgb(112, 128, 144)),
    ("whitesmoke", Color::rgb(245, 245, 245)),
    ("cornsilk", Color::rgb(255, 248, 220)),
];

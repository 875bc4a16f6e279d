//! Generation request model: content, colors, size and error correction.

use std::fmt;
use std::str::FromStr;

use image::Rgba;

use crate::{MAX_PIXEL_SIZE, PLACEHOLDER_CONTENT, QrEngineError, Result};

/// An RGBA color parsed from a CSS hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const BLACK: Color = Color([0, 0, 0, 255]);
    pub const WHITE: Color = Color([255, 255, 255, 255]);

    /// Parse `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(value: &str) -> Result<Self> {
        let invalid = || QrEngineError::InvalidColor(value.to_string());
        let hex = value.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map(|v| v * 17);
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);

        let rgba = match hex.len() {
            3 | 4 => {
                let a = if hex.len() == 4 { nibble(3) } else { Ok(255) };
                [nibble(0), nibble(1), nibble(2), a]
            }
            6 | 8 => {
                let a = if hex.len() == 8 { byte(6) } else { Ok(255) };
                [byte(0), byte(2), byte(4), a]
            }
            _ => return Err(invalid()),
        };

        let mut out = [0u8; 4];
        for (slot, channel) in out.iter_mut().zip(rgba) {
            *slot = channel.map_err(|_| invalid())?;
        }
        Ok(Self(out))
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba(self.0)
    }
}

impl FromStr for Color {
    type Err = QrEngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        if a == 255 {
            write!(f, "#{r:02x}{g:02x}{b:02x}")
        } else {
            write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

/// QR error-correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorCorrection {
    /// ~7% recovery.
    Low,
    /// ~15% recovery.
    Medium,
    /// ~25% recovery.
    Quartile,
    /// ~30% recovery; leaves the most room for a logo.
    #[default]
    High,
}

impl ErrorCorrection {
    pub const ALL: [ErrorCorrection; 4] = [Self::Low, Self::Medium, Self::Quartile, Self::High];

    pub fn letter(self) -> char {
        match self {
            Self::Low => 'L',
            Self::Medium => 'M',
            Self::Quartile => 'Q',
            Self::High => 'H',
        }
    }

    pub(crate) fn ec_level(self) -> qrcode::EcLevel {
        match self {
            Self::Low => qrcode::EcLevel::L,
            Self::Medium => qrcode::EcLevel::M,
            Self::Quartile => qrcode::EcLevel::Q,
            Self::High => qrcode::EcLevel::H,
        }
    }
}

impl FromStr for ErrorCorrection {
    type Err = QrEngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(Self::Low),
            "M" => Ok(Self::Medium),
            "Q" => Ok(Self::Quartile),
            "H" => Ok(Self::High),
            _ => Err(QrEngineError::InvalidErrorCorrection(s.to_string())),
        }
    }
}

impl fmt::Display for ErrorCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// The three size buttons offered by the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizePreset {
    Small,
    Medium,
    Large,
}

impl SizePreset {
    pub fn pixels(self) -> u32 {
        match self {
            Self::Small => 150,
            Self::Medium => 256,
            Self::Large => 350,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            _ => None,
        }
    }
}

/// Immutable description of one QR image to generate.
///
/// Edits go through the `with_*` methods, each returning a new request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    content: String,
    dark_color: Color,
    light_color: Color,
    pixel_size: u32,
    error_correction: ErrorCorrection,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            content: String::new(),
            dark_color: Color::BLACK,
            light_color: Color::WHITE,
            pixel_size: SizePreset::Medium.pixels(),
            error_correction: ErrorCorrection::High,
        }
    }
}

impl GenerationRequest {
    /// Create a request for `content` with default colors, size and level.
    pub fn new(content: impl Into<String>) -> Self {
        Self::default().with_content(content)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Text actually encoded: the content, or the placeholder when empty.
    pub fn effective_content(&self) -> &str {
        if self.content.is_empty() {
            PLACEHOLDER_CONTENT
        } else {
            &self.content
        }
    }

    pub fn dark_color(&self) -> Color {
        self.dark_color
    }

    pub fn light_color(&self) -> Color {
        self.light_color
    }

    pub fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    pub fn error_correction(&self) -> ErrorCorrection {
        self.error_correction
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_dark_color(mut self, color: Color) -> Self {
        self.dark_color = color;
        self
    }

    pub fn with_light_color(mut self, color: Color) -> Self {
        self.light_color = color;
        self
    }

    /// Set the output side length, `1..=MAX_PIXEL_SIZE`.
    pub fn with_pixel_size(mut self, pixel_size: u32) -> Result<Self> {
        if pixel_size == 0 || pixel_size > MAX_PIXEL_SIZE {
            return Err(QrEngineError::InvalidPixelSize {
                size: pixel_size,
                max: MAX_PIXEL_SIZE,
            });
        }
        self.pixel_size = pixel_size;
        Ok(self)
    }

    pub fn with_size_preset(mut self, preset: SizePreset) -> Self {
        self.pixel_size = preset.pixels();
        self
    }

    pub fn with_error_correction(mut self, level: ErrorCorrection) -> Self {
        self.error_correction = level;
        self
    }
}

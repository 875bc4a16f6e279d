//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;

use qr_engine::{Color, ErrorCorrection, GenerationRequest};

use super::defaults::get_default;
use super::validation::validate_setting;
use crate::clipboard::ClipboardMode;

/// Runtime configuration for a studio session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioConfig {
    pub dark_color: Color,
    pub light_color: Color,
    pub pixel_size: u32,
    pub error_correction: ErrorCorrection,
    pub download_dir: PathBuf,
    pub clipboard_mode: ClipboardMode,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            dark_color: Color::BLACK,
            light_color: Color::WHITE,
            pixel_size: 256,
            error_correction: ErrorCorrection::High,
            download_dir: default_download_dir(),
            clipboard_mode: ClipboardMode::Image,
        }
    }
}

impl StudioConfig {
    /// Load configuration from the process environment.
    pub fn load() -> Self {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, falling back to defaults for
    /// missing or invalid values.
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let g = |key: &str| -> String {
            let default = get_default(key).unwrap_or_default();
            match lookup(key) {
                Some(v) if v.trim().is_empty() => default.to_string(),
                Some(v) => match validate_setting(key, v.trim()) {
                    Ok(()) => v.trim().to_string(),
                    Err(e) => {
                        tracing::warn!(key, value = %v, "Invalid setting ({e}), using default");
                        default.to_string()
                    }
                },
                None => default.to_string(),
            }
        };

        let defaults = Self::default();
        let download_dir = {
            let d = g("QR_STUDIO_DOWNLOAD_DIR");
            if d.is_empty() { defaults.download_dir } else { PathBuf::from(d) }
        };

        Self {
            dark_color: Color::from_hex(&g("QR_STUDIO_DARK_COLOR")).unwrap_or(defaults.dark_color),
            light_color: Color::from_hex(&g("QR_STUDIO_LIGHT_COLOR"))
                .unwrap_or(defaults.light_color),
            pixel_size: g("QR_STUDIO_PIXEL_SIZE").parse().unwrap_or(defaults.pixel_size),
            error_correction: g("QR_STUDIO_ERROR_CORRECTION")
                .parse()
                .unwrap_or(defaults.error_correction),
            download_dir,
            clipboard_mode: ClipboardMode::from_setting(&g("QR_STUDIO_CLIPBOARD_MODE")),
        }
    }

    /// The request shown when the studio opens: empty content, configured
    /// colors, size and level.
    pub fn initial_request(&self) -> GenerationRequest {
        let request = GenerationRequest::default()
            .with_dark_color(self.dark_color)
            .with_light_color(self.light_color)
            .with_error_correction(self.error_correction);
        // pixel_size is range-checked on load; a struct built by hand may not be.
        request
            .clone()
            .with_pixel_size(self.pixel_size)
            .unwrap_or(request)
    }
}

/// OS download directory, or the working directory when there is none.
fn default_download_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

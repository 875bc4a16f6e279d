//! QR encoder adapter: request in, exact-size off-screen bitmap out.

use image::RgbaImage;
use qrcode::QrCode;
use tracing::debug;

use crate::request::GenerationRequest;
use crate::{QrEngineError, Result};

/// Quiet zone width in modules on each side of the symbol.
pub const QUIET_ZONE: u32 = 4;

/// Turns a request into a `pixel_size × pixel_size` bitmap.
///
/// Implementations must not touch any visible surface; the returned image
/// is handed to the compositor by the caller.
pub trait QrEncoder: Send + Sync {
    fn encode(&self, request: &GenerationRequest) -> Result<RgbaImage>;
}

/// Default encoder backed by the `qrcode` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleEncoder;

impl QrEncoder for ModuleEncoder {
    fn encode(&self, request: &GenerationRequest) -> Result<RgbaImage> {
        let content = request.effective_content();
        let code = QrCode::with_error_correction_level(
            content.as_bytes(),
            request.error_correction().ec_level(),
        )
        .map_err(|e| QrEngineError::Encoding(e.to_string()))?;

        debug!(
            modules = code.width(),
            size = request.pixel_size(),
            level = %request.error_correction(),
            "Encoded QR symbol"
        );

        Ok(rasterize(&code, request))
    }
}

/// Paint the module matrix onto a bitmap of exactly `pixel_size` pixels.
///
/// The symbol plus quiet zone is stretched over the whole side length, so a
/// module may cover a fractional number of pixels; each pixel takes the
/// color of the module under its top-left corner.
fn rasterize(code: &QrCode, request: &GenerationRequest) -> RgbaImage {
    let size = request.pixel_size();
    let dark = request.dark_color().to_rgba();
    let light = request.light_color().to_rgba();

    let modules = code.to_colors();
    let module_count = code.width() as u64;
    let total = module_count + 2 * u64::from(QUIET_ZONE);
    let quiet = u64::from(QUIET_ZONE);

    // Module index along one axis for every pixel column/row.
    let lookup: Vec<Option<usize>> = (0..u64::from(size))
        .map(|p| {
            let m = p * total / u64::from(size);
            (m >= quiet && m < quiet + module_count).then(|| (m - quiet) as usize)
        })
        .collect();

    RgbaImage::from_fn(size, size, |x, y| {
        match (lookup[x as usize], lookup[y as usize]) {
            (Some(mx), Some(my)) if modules[my * module_count as usize + mx] == qrcode::Color::Dark => {
                dark
            }
            _ => light,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Color, ErrorCorrection};

    #[test]
    fn encode_produces_exact_size_for_every_preset_and_level() {
        for size in [150, 256, 350] {
            for level in ErrorCorrection::ALL {
                let req = GenerationRequest::new("https://example.com")
                    .with_pixel_size(size)
                    .unwrap()
                    .with_error_correction(level);
                let img = ModuleEncoder.encode(&req).unwrap();
                assert_eq!(img.dimensions(), (size, size), "size {size} level {level}");
            }
        }
    }

    #[test]
    fn empty_content_encodes_placeholder_at_every_level() {
        for level in ErrorCorrection::ALL {
            let req = GenerationRequest::default().with_error_correction(level);
            assert!(ModuleEncoder.encode(&req).is_ok(), "level {level}");
        }
    }

    #[test]
    fn quiet_zone_uses_light_color() {
        let light = Color::from_hex("#ff0000").unwrap();
        let req = GenerationRequest::new("hello").with_light_color(light);
        let img = ModuleEncoder.encode(&req).unwrap();
        assert_eq!(*img.get_pixel(0, 0), light.to_rgba());
        assert_eq!(*img.get_pixel(255, 255), light.to_rgba());
    }

    #[test]
    fn finder_pattern_uses_dark_color() {
        let dark = Color::from_hex("#0000ff").unwrap();
        let req = GenerationRequest::new("hello").with_dark_color(dark);
        let img = ModuleEncoder.encode(&req).unwrap();

        // Version 1 at 256px: 29 modules total, ~8.8px per module. The first
        // finder module sits right after the 4-module quiet zone.
        let first_module = (4 * 256) / 29 + 1;
        assert_eq!(*img.get_pixel(first_module, first_module), dark.to_rgba());
    }

    #[test]
    fn content_too_long_for_level_fails() {
        let req = GenerationRequest::new("x".repeat(3000))
            .with_error_correction(ErrorCorrection::High);
        let err = ModuleEncoder.encode(&req).unwrap_err();
        assert!(matches!(err, QrEngineError::Encoding(_)));
    }

    #[test]
    fn encoding_is_deterministic() {
        let req = GenerationRequest::new("same input");
        assert_eq!(ModuleEncoder.encode(&req).unwrap(), ModuleEncoder.encode(&req).unwrap());
    }
}

//! Export helpers: PNG bytes and data URLs of a composed surface.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use crate::{QrEngineError, Result};

/// File name used when saving the QR code.
pub const DOWNLOAD_FILE_NAME: &str = "qr_code.png";

/// Encode an RGBA surface as PNG.
pub fn encode_png(surface: &RgbaImage) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(
            surface.as_raw(),
            surface.width(),
            surface.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| QrEngineError::PngEncode(e.to_string()))?;
    Ok(png)
}

/// Encode an RGBA surface as a `data:image/png;base64,` URL.
pub fn to_data_url(surface: &RgbaImage) -> Result<String> {
    let png = encode_png(surface)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

/// Decode PNG bytes back into an RGBA image.
pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage> {
    image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .map(|img| img.to_rgba8())
        .map_err(|e| QrEngineError::ImageDecode(e.to_string()))
}

/// Decode the PNG inside a data URL produced by [`to_data_url`].
pub fn decode_data_url(url: &str) -> Result<RgbaImage> {
    let payload = url
        .strip_prefix("data:image/png;base64,")
        .ok_or_else(|| QrEngineError::ImageDecode("not a PNG data URL".into()))?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| QrEngineError::ImageDecode(e.to_string()))?;
    decode_png(&bytes)
}

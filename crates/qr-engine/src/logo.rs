//! Logo overlay: size-capped source bytes and the scaled, decoded image.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use image::imageops::FilterType;
use tracing::debug;

use crate::compose::logo_rect;
use crate::{MAX_LOGO_BYTES, QrEngineError, Result};

/// A user-selected logo file, held only for the current session.
///
/// Cloning is cheap; the bytes are shared.
#[derive(Clone, PartialEq, Eq)]
pub struct LogoOverlay {
    bytes: Arc<[u8]>,
    file_name: String,
}

impl fmt::Debug for LogoOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogoOverlay")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl LogoOverlay {
    /// Load a logo from disk, rejecting files over [`MAX_LOGO_BYTES`]
    /// before reading their contents.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let size = std::fs::metadata(path)?.len();
        check_size(size)?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = std::fs::read(path)?;
        // The file may have grown between stat and read.
        check_size(bytes.len() as u64)?;

        debug!(file_name = %file_name, size, "Loaded logo file");
        Ok(Self {
            bytes: bytes.into(),
            file_name,
        })
    }

    /// Wrap bytes that were already read by the caller.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        check_size(bytes.len() as u64)?;
        Ok(Self {
            bytes: bytes.into(),
            file_name: file_name.into(),
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Decode the logo and scale it to the logo rect of a `surface_size`
    /// surface. The image is stretched to a square, like a canvas draw.
    pub fn decode(&self, surface_size: u32) -> Result<LogoImage> {
        let decoded = image::load_from_memory(&self.bytes)
            .map_err(|e| QrEngineError::LogoDecode(e.to_string()))?;
        let side = logo_rect(surface_size).side;

        if side == 0 {
            return Ok(LogoImage::from_rgba(RgbaImage::new(0, 0)));
        }

        debug!(
            orig_w = decoded.width(),
            orig_h = decoded.height(),
            side,
            "Scaling logo to overlay size"
        );

        let scaled = if decoded.width() == side && decoded.height() == side {
            decoded.to_rgba8()
        } else {
            decoded
                .resize_exact(side, side, FilterType::Lanczos3)
                .to_rgba8()
        };
        Ok(LogoImage::from_rgba(scaled))
    }
}

fn check_size(size: u64) -> Result<()> {
    if size > MAX_LOGO_BYTES {
        return Err(QrEngineError::OversizedLogoFile {
            size,
            limit: MAX_LOGO_BYTES,
        });
    }
    Ok(())
}

/// A decoded logo, already scaled to its overlay rect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoImage {
    image: RgbaImage,
}

impl LogoImage {
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::encode_png;
    use image::Rgba;
    use std::io::Write;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        encode_png(&RgbaImage::from_pixel(w, h, Rgba([0, 128, 255, 255]))).unwrap()
    }

    #[test]
    fn from_bytes_accepts_limit_exactly() {
        let logo = LogoOverlay::from_bytes("edge.bin", vec![0u8; MAX_LOGO_BYTES as usize]);
        assert!(logo.is_ok());
    }

    #[test]
    fn from_bytes_rejects_oversized() {
        let err = LogoOverlay::from_bytes("big.png", vec![0u8; MAX_LOGO_BYTES as usize + 1])
            .unwrap_err();
        assert!(matches!(
            err,
            QrEngineError::OversizedLogoFile { size, limit }
                if size == MAX_LOGO_BYTES + 1 && limit == MAX_LOGO_BYTES
        ));
    }

    #[test]
    fn from_path_rejects_oversized_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&vec![0u8; MAX_LOGO_BYTES as usize + 10]).unwrap();
        let err = LogoOverlay::from_path(file.path()).unwrap_err();
        assert!(matches!(err, QrEngineError::OversizedLogoFile { .. }));
    }

    #[test]
    fn from_path_keeps_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brand.png");
        std::fs::write(&path, png_bytes(10, 10)).unwrap();

        let logo = LogoOverlay::from_path(&path).unwrap();
        assert_eq!(logo.file_name(), "brand.png");
    }

    #[test]
    fn decode_scales_to_quarter_of_surface() {
        let logo = LogoOverlay::from_bytes("wide.png", png_bytes(300, 120)).unwrap();
        let decoded = logo.decode(256).unwrap();
        assert_eq!(decoded.image().dimensions(), (64, 64));
    }

    #[test]
    fn decode_rejects_garbage() {
        let logo = LogoOverlay::from_bytes("junk.png", b"not an image".to_vec()).unwrap();
        assert!(matches!(logo.decode(256), Err(QrEngineError::LogoDecode(_))));
    }
}

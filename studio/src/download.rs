//! Save-as-file export.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use qr_engine::{DOWNLOAD_FILE_NAME, encode_png};

use crate::Result;

/// Write `surface` as PNG to `<dir>/qr_code.png`, creating `dir` if needed.
pub fn save_png(dir: &Path, surface: &RgbaImage) -> Result<PathBuf> {
    let png = encode_png(surface)?;

    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }
    let path = dir.join(DOWNLOAD_FILE_NAME);
    std::fs::write(&path, &png)?;

    tracing::info!(path = %path.display(), bytes = png.len(), "QR code saved");
    Ok(path)
}

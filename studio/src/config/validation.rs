//! Setting value validation.

use qr_engine::MAX_PIXEL_SIZE;
use regex::Regex;
use std::sync::LazyLock;

static RE_HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#([0-9A-Fa-f]{3}|[0-9A-Fa-f]{4}|[0-9A-Fa-f]{6}|[0-9A-Fa-f]{8})$").unwrap()
});

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        "QR_STUDIO_DARK_COLOR" | "QR_STUDIO_LIGHT_COLOR" => {
            if !RE_HEX_COLOR.is_match(value) {
                return Err("must be a hex color like #000000".into());
            }
        }
        "QR_STUDIO_PIXEL_SIZE" => validate_u32_range(value, 1, MAX_PIXEL_SIZE)?,
        "QR_STUDIO_ERROR_CORRECTION" => {
            if !["L", "M", "Q", "H"].contains(&value.to_uppercase().as_str()) {
                return Err("must be L, M, Q, or H".into());
            }
        }
        "QR_STUDIO_CLIPBOARD_MODE" => {
            if value != "image" && value != "data_url" {
                return Err("must be 'image' or 'data_url'".into());
            }
        }
        "QR_STUDIO_DOWNLOAD_DIR" => {
            if value.contains('\0') {
                return Err("must not contain NUL bytes".into());
            }
        }
        _ => {}
    }
    Ok(())
}

fn validate_u32_range(value: &str, min: u32, max: u32) -> Result<(), String> {
    let v: u32 = value.parse().map_err(|_| "must be a positive integer")?;
    if v < min || v > max {
        return Err(format!("must be between {min} and {max}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_colors() {
        assert!(validate_setting("QR_STUDIO_DARK_COLOR", "#000").is_ok());
        assert!(validate_setting("QR_STUDIO_DARK_COLOR", "#1E88E5").is_ok());
        assert!(validate_setting("QR_STUDIO_LIGHT_COLOR", "#ffffff80").is_ok());
    }

    #[test]
    fn test_invalid_colors() {
        assert!(validate_setting("QR_STUDIO_DARK_COLOR", "black").is_err());
        assert!(validate_setting("QR_STUDIO_LIGHT_COLOR", "#fffff").is_err());
        assert!(validate_setting("QR_STUDIO_LIGHT_COLOR", "ffffff").is_err());
    }

    #[test]
    fn test_pixel_size_range() {
        assert!(validate_setting("QR_STUDIO_PIXEL_SIZE", "150").is_ok());
        assert!(validate_setting("QR_STUDIO_PIXEL_SIZE", "0").is_err());
        assert!(validate_setting("QR_STUDIO_PIXEL_SIZE", "-1").is_err());
        assert!(validate_setting("QR_STUDIO_PIXEL_SIZE", "5000").is_err());
        assert!(validate_setting("QR_STUDIO_PIXEL_SIZE", "big").is_err());
    }

    #[test]
    fn test_error_correction() {
        for ok in ["L", "m", "Q", "h"] {
            assert!(validate_setting("QR_STUDIO_ERROR_CORRECTION", ok).is_ok());
        }
        assert!(validate_setting("QR_STUDIO_ERROR_CORRECTION", "X").is_err());
    }

    #[test]
    fn test_clipboard_mode() {
        assert!(validate_setting("QR_STUDIO_CLIPBOARD_MODE", "image").is_ok());
        assert!(validate_setting("QR_STUDIO_CLIPBOARD_MODE", "data_url").is_ok());
        assert!(validate_setting("QR_STUDIO_CLIPBOARD_MODE", "text").is_err());
    }

    #[test]
    fn test_unknown_key_passes() {
        assert!(validate_setting("UNKNOWN", "anything").is_ok());
    }
}

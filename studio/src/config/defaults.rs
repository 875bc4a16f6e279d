//! All setting definitions with their default values.

use std::collections::HashMap;
use std::sync::LazyLock;

type DefTuple = (&'static str, &'static str, &'static str);

const DEFS: &[DefTuple] = &[
    ("QR_STUDIO_DARK_COLOR", "#000000", "Color of dark modules (CSS hex)"),
    ("QR_STUDIO_LIGHT_COLOR", "#ffffff", "Background and quiet zone color (CSS hex)"),
    ("QR_STUDIO_PIXEL_SIZE", "256", "Initial output size in pixels"),
    ("QR_STUDIO_ERROR_CORRECTION", "H", "Initial error correction level (L, M, Q, H)"),
    (
        "QR_STUDIO_DOWNLOAD_DIR",
        "",
        "Directory for saved QR codes; empty uses the OS download directory",
    ),
    ("QR_STUDIO_CLIPBOARD_MODE", "image", "What copy places on the clipboard: image or data_url"),
];

/// A single setting definition.
#[derive(Debug, Clone)]
pub struct SettingDef {
    pub key: &'static str,
    pub default: &'static str,
    pub description: &'static str,
}

/// Global setting definitions indexed by key.
pub static DEFAULT_SETTINGS: LazyLock<HashMap<&'static str, SettingDef>> = LazyLock::new(|| {
    DEFS.iter()
        .map(|&(key, default, description)| {
            (
                key,
                SettingDef {
                    key,
                    default,
                    description,
                },
            )
        })
        .collect()
});

/// Get the default value for a setting key, or `None` if not defined.
pub fn get_default(key: &str) -> Option<&'static str> {
    DEFAULT_SETTINGS.get(key).map(|d| d.default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validation::validate_setting;

    #[test]
    fn every_default_passes_validation() {
        for def in DEFAULT_SETTINGS.values() {
            assert!(
                validate_setting(def.key, def.default).is_ok(),
                "default for {} is invalid",
                def.key
            );
            assert!(!def.description.is_empty());
        }
    }

    #[test]
    fn unknown_key_has_no_default() {
        assert_eq!(get_default("QR_STUDIO_NOPE"), None);
        assert_eq!(get_default("QR_STUDIO_PIXEL_SIZE"), Some("256"));
    }
}

//! Transient user notices (the toast shown after an action or error).

use serde::{Deserialize, Serialize};

/// How long a notice stays on screen.
pub const DISPLAY_MS: u64 = 2000;

pub const OVERSIZED_LOGO_MESSAGE: &str = "File size exceeds 2MB. Please upload a smaller image.";
pub const COPIED_MESSAGE: &str = "QR Code copied to clipboard!";

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A notice to be displayed to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub timestamp: String,
    pub display_ms: u64,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            display_ms: DISPLAY_MS,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    /// JSON line for the shell output.
    pub fn to_json_line(&self) -> String {
        serde_json::json!({ "type": "notice", "data": self }).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_serializes_lowercase_level() {
        let notice = Notice::error("boom");
        let value: serde_json::Value = serde_json::from_str(&notice.to_json_line()).unwrap();
        assert_eq!(value["type"], "notice");
        assert_eq!(value["data"]["level"], "error");
        assert_eq!(value["data"]["message"], "boom");
        assert_eq!(value["data"]["display_ms"], 2000);
    }

    #[test]
    fn timestamp_is_rfc3339() {
        let notice = Notice::success("ok");
        assert!(chrono::DateTime::parse_from_rfc3339(&notice.timestamp).is_ok());
    }
}

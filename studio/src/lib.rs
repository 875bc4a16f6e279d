//! QR studio: the interactive side of the QR composition pipeline.
//!
//! A [`app::Studio`] owns the form state (content, colors, size, error
//! correction, logo) and re-renders through a [`session::SessionHandle`] on
//! every change. Saved files and clipboard copies are taken from the last
//! composed surface.

pub mod app;
pub mod clipboard;
pub mod config;
pub mod download;
pub mod notice;
pub mod session;
pub mod shell;

use qr_engine::QrEngineError;

pub use config::StudioConfig;

/// Errors surfaced by studio actions. None of them end the session.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    #[error(transparent)]
    Engine(#[from] QrEngineError),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("QR session is no longer running")]
    SessionClosed,

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for studio operations.
pub type Result<T> = std::result::Result<T, StudioError>;

/// Load .env from multiple candidate paths.
pub fn load_dotenv() {
    let candidates = [".env", "../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::info!("No .env file found, using system environment variables");
}

/// Load `.env`, then the runtime configuration.
pub fn init_config() -> StudioConfig {
    load_dotenv();
    let config = StudioConfig::load();
    tracing::info!(
        size = config.pixel_size,
        level = %config.error_correction,
        download_dir = %config.download_dir.display(),
        clipboard_mode = ?config.clipboard_mode,
        "Settings loaded"
    );
    config
}

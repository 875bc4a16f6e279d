//! QR composition pipeline.
//!
//! Encodes a [`GenerationRequest`] into an exact-size bitmap, composes an
//! optional centered logo on top of it, and serializes the result to PNG
//! for saving or clipboard placement. Async completions are correlated to
//! requests through [`Ticket`]s in the [`pipeline::Pipeline`] state machine.

pub mod compose;
pub mod encode;
pub mod export;
pub mod logo;
pub mod pipeline;
pub mod request;

// Re-exports for convenience
pub use compose::{LogoRect, compose, logo_rect};
pub use encode::{ModuleEncoder, QrEncoder};
pub use export::{DOWNLOAD_FILE_NAME, decode_data_url, decode_png, encode_png, to_data_url};
pub use logo::{LogoImage, LogoOverlay};
pub use pipeline::{ComposedSurface, Outcome, Pipeline, PipelineState, Ticket};
pub use request::{Color, ErrorCorrection, GenerationRequest, SizePreset};

/// Largest logo file accepted, in bytes.
pub const MAX_LOGO_BYTES: u64 = 2 * 1024 * 1024;

/// Largest accepted output side length in pixels.
pub const MAX_PIXEL_SIZE: u32 = 4096;

/// Content encoded when the user leaves the text empty.
pub const PLACEHOLDER_CONTENT: &str =
    "https://play.google.com/store/apps/details?id=com.rovenkodev.FitnessGuru";

/// Errors that can occur while building, composing or exporting a QR image.
#[derive(Debug, thiserror::Error)]
pub enum QrEngineError {
    #[error("Logo file is {size} bytes, limit is {limit} bytes")]
    OversizedLogoFile { size: u64, limit: u64 },

    #[error("QR encode error: {0}")]
    Encoding(String),

    #[error("Logo decode error: {0}")]
    LogoDecode(String),

    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("Invalid color value: {0}")]
    InvalidColor(String),

    #[error("Pixel size must be between 1 and {max}, got {size}")]
    InvalidPixelSize { size: u32, max: u32 },

    #[error("Unknown error correction level: {0}")]
    InvalidErrorCorrection(String),

    #[error("No composed QR code available to export")]
    ExportUnavailable,

    #[error("PNG encode error: {0}")]
    PngEncode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for qr-engine operations.
pub type Result<T> = std::result::Result<T, QrEngineError>;

//! Clipboard export of the composed QR code.
//!
//! By default the RGBA image itself is placed on the clipboard so it can be
//! pasted as a picture. [`ClipboardMode::DataUrl`] copies a
//! `data:image/png;base64,` string instead, for targets that only accept text.

use std::borrow::Cow;

use image::RgbaImage;

use crate::{Result, StudioError};

/// What a copy places on the clipboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipboardMode {
    #[default]
    Image,
    DataUrl,
}

impl ClipboardMode {
    pub fn from_setting(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "data_url" => Self::DataUrl,
            _ => Self::Image,
        }
    }
}

/// Destination for copied QR codes.
pub trait ClipboardSink {
    /// Place raw RGBA8 pixels on the clipboard.
    fn set_image(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<()>;

    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The system clipboard, via `arboard`.
///
/// On Linux the owning process serves clipboard contents, so the handle is
/// kept alive for the lifetime of the sink.
#[derive(Default)]
pub struct SystemClipboard {
    handle: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self) -> Result<&mut arboard::Clipboard> {
        if self.handle.is_none() {
            let clipboard = arboard::Clipboard::new()
                .map_err(|e| StudioError::Clipboard(format!("Failed to access clipboard: {e}")))?;
            self.handle = Some(clipboard);
        }
        self.handle
            .as_mut()
            .ok_or_else(|| StudioError::Clipboard("clipboard unavailable".into()))
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_image(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<()> {
        let data = arboard::ImageData {
            width: width as usize,
            height: height as usize,
            bytes: Cow::Borrowed(rgba),
        };
        self.handle()?
            .set_image(data)
            .map_err(|e| StudioError::Clipboard(e.to_string()))
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        self.handle()?
            .set_text(text.to_owned())
            .map_err(|e| StudioError::Clipboard(e.to_string()))
    }
}

/// Copy `surface` to `sink` according to `mode`.
pub fn copy_surface(sink: &mut dyn ClipboardSink, mode: ClipboardMode, surface: &RgbaImage) -> Result<()> {
    match mode {
        ClipboardMode::Image => sink.set_image(surface.width(), surface.height(), surface.as_raw()),
        ClipboardMode::DataUrl => {
            let url = qr_engine::to_data_url(surface)?;
            sink.set_text(&url)
        }
    }?;
    tracing::info!(
        width = surface.width(),
        height = surface.height(),
        ?mode,
        "QR code copied to clipboard"
    );
    Ok(())
}

/// In-memory clipboard, used by tests and headless runs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryClipboard {
    pub image: Option<(u32, u32, Vec<u8>)>,
    pub text: Option<String>,
    /// When set, every write fails with this message.
    pub fail_with: Option<String>,
}

impl ClipboardSink for MemoryClipboard {
    fn set_image(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<()> {
        if let Some(msg) = &self.fail_with {
            return Err(StudioError::Clipboard(msg.clone()));
        }
        self.image = Some((width, height, rgba.to_vec()));
        Ok(())
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        if let Some(msg) = &self.fail_with {
            return Err(StudioError::Clipboard(msg.clone()));
        }
        self.text = Some(text.to_string());
        Ok(())
    }
}

//! The studio front end: owns the current request and logo, forwards every
//! change to the session, and turns errors into notices.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use qr_engine::{
    Color, ErrorCorrection, GenerationRequest, LogoOverlay, ModuleEncoder, QrEncoder,
    QrEngineError, SizePreset, Ticket,
};
use tokio::sync::broadcast;

use crate::clipboard::{ClipboardMode, ClipboardSink, copy_surface};
use crate::config::StudioConfig;
use crate::download::save_png;
use crate::notice::{COPIED_MESSAGE, Notice, OVERSIZED_LOGO_MESSAGE};
use crate::session::{SessionHandle, Snapshot};
use crate::{Result, StudioError};

/// Buffered notices per subscriber.
const NOTICE_CAPACITY: usize = 64;

/// Single owner of the editable form state.
pub struct Studio {
    request: GenerationRequest,
    logo: Option<LogoOverlay>,
    session: SessionHandle,
    notices: broadcast::Sender<Notice>,
    clipboard: Box<dyn ClipboardSink>,
    clipboard_mode: ClipboardMode,
    download_dir: PathBuf,
}

impl Studio {
    /// Open a studio with the default encoder and render the initial request.
    pub async fn open(config: &StudioConfig, clipboard: Box<dyn ClipboardSink>) -> Result<Self> {
        Self::open_with_encoder(config, clipboard, Arc::new(ModuleEncoder)).await
    }

    pub async fn open_with_encoder(
        config: &StudioConfig,
        clipboard: Box<dyn ClipboardSink>,
        encoder: Arc<dyn QrEncoder>,
    ) -> Result<Self> {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        let session = SessionHandle::spawn(encoder, notices.clone());
        let studio = Self {
            request: config.initial_request(),
            logo: None,
            session,
            notices,
            clipboard,
            clipboard_mode: config.clipboard_mode,
            download_dir: config.download_dir.clone(),
        };
        studio.rerender().await?;
        Ok(studio)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }

    pub fn logo(&self) -> Option<&LogoOverlay> {
        self.logo.as_ref()
    }

    pub async fn set_content(&mut self, content: impl Into<String>) -> Result<Ticket> {
        self.update(self.request.clone().with_content(content)).await
    }

    /// Empty the text field; the placeholder is encoded instead.
    pub async fn clear_content(&mut self) -> Result<Ticket> {
        self.set_content(String::new()).await
    }

    pub async fn set_dark_color(&mut self, hex: &str) -> Result<Ticket> {
        let color = self.check(Color::from_hex(hex))?;
        self.update(self.request.clone().with_dark_color(color)).await
    }

    pub async fn set_light_color(&mut self, hex: &str) -> Result<Ticket> {
        let color = self.check(Color::from_hex(hex))?;
        self.update(self.request.clone().with_light_color(color)).await
    }

    pub async fn set_size_preset(&mut self, preset: SizePreset) -> Result<Ticket> {
        self.update(self.request.clone().with_size_preset(preset)).await
    }

    pub async fn set_pixel_size(&mut self, pixel_size: u32) -> Result<Ticket> {
        let request = self.check(self.request.clone().with_pixel_size(pixel_size))?;
        self.update(request).await
    }

    pub async fn set_error_correction(&mut self, level: ErrorCorrection) -> Result<Ticket> {
        self.update(self.request.clone().with_error_correction(level)).await
    }

    /// Attach a logo file. Files over the size cap are rejected before any
    /// state changes.
    pub async fn choose_logo(&mut self, path: &Path) -> Result<Ticket> {
        let logo = match LogoOverlay::from_path(path) {
            Ok(logo) => logo,
            Err(e @ QrEngineError::OversizedLogoFile { .. }) => {
                tracing::warn!(path = %path.display(), error = %e, "Logo rejected");
                self.notify(Notice::error(OVERSIZED_LOGO_MESSAGE));
                return Err(e.into());
            }
            Err(e) => return Err(self.fail(e.into())),
        };
        self.attach_logo(logo).await
    }

    /// Attach an already-validated logo, replacing any previous one.
    pub async fn attach_logo(&mut self, logo: LogoOverlay) -> Result<Ticket> {
        tracing::info!(file_name = %logo.file_name(), "Logo attached");
        self.logo = Some(logo);
        self.rerender().await
    }

    pub async fn remove_logo(&mut self) -> Result<Ticket> {
        if self.logo.take().is_some() {
            tracing::info!("Logo removed");
        }
        self.rerender().await
    }

    /// Save the composed QR code as `qr_code.png` in `dir`, or the
    /// configured download directory.
    pub async fn download(&mut self, dir: Option<&Path>) -> Result<PathBuf> {
        let surface = self.session.export_surface().await;
        let surface = self.check_studio(surface)?;
        let dir = dir.unwrap_or(self.download_dir.as_path()).to_path_buf();
        let path = self.check_studio(save_png(&dir, &surface))?;
        self.notify(Notice::success(format!("QR Code saved to {}", path.display())));
        Ok(path)
    }

    /// Copy the composed QR code to the clipboard.
    pub async fn copy_to_clipboard(&mut self) -> Result<()> {
        let surface = self.session.export_surface().await;
        let surface = self.check_studio(surface)?;
        match copy_surface(self.clipboard.as_mut(), self.clipboard_mode, &surface) {
            Ok(()) => {
                self.notify(Notice::success(COPIED_MESSAGE));
                Ok(())
            }
            Err(e) => {
                let message = format!("Could not copy QR Code: {e}");
                tracing::error!(error = %e, "Clipboard write failed");
                self.notify(Notice::error(message));
                Err(e)
            }
        }
    }

    pub async fn status(&self) -> Result<Snapshot> {
        self.session.settle().await
    }

    async fn update(&mut self, request: GenerationRequest) -> Result<Ticket> {
        self.request = request;
        self.rerender().await
    }

    async fn rerender(&self) -> Result<Ticket> {
        self.session
            .submit(self.request.clone(), self.logo.clone())
            .await
    }

    fn check<T>(&self, result: qr_engine::Result<T>) -> Result<T> {
        result.map_err(|e| self.fail(e.into()))
    }

    fn check_studio<T>(&self, result: Result<T>) -> Result<T> {
        result.map_err(|e| self.fail(e))
    }

    fn fail(&self, e: StudioError) -> StudioError {
        tracing::warn!(error = %e, "Studio action failed");
        self.notify(Notice::error(e.to_string()));
        e
    }

    fn notify(&self, notice: Notice) {
        let _ = self.notices.send(notice);
    }
}

//! Session driver: re-runs the QR pipeline on every submitted request.
//!
//! A single event loop owns the [`Pipeline`] and therefore the visible
//! surface. Encoding and logo decoding run on the blocking pool and report
//! back over a completion channel, tagged with the ticket of the request
//! that started them; the pipeline drops anything stale.

use std::sync::Arc;

use image::RgbaImage;
use qr_engine::{
    GenerationRequest, LogoImage, LogoOverlay, Outcome, Pipeline, PipelineState, QrEncoder,
    QrEngineError, Ticket,
};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::notice::Notice;
use crate::{Result, StudioError};

/// Maximum number of queued session commands.
const COMMAND_CAPACITY: usize = 64;

/// Status of the session after all in-flight work has finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub ticket: u64,
    pub state: &'static str,
    pub has_surface: bool,
    pub surface_ticket: Option<u64>,
    pub logo_drawn: bool,
    pub size: Option<u32>,
    /// File name of the logo attached to the latest request.
    pub logo_file_name: Option<String>,
}

enum Command {
    Submit {
        request: GenerationRequest,
        logo: Option<LogoOverlay>,
        reply: oneshot::Sender<Ticket>,
    },
    Settle {
        reply: oneshot::Sender<Snapshot>,
    },
    Export {
        reply: oneshot::Sender<std::result::Result<RgbaImage, QrEngineError>>,
    },
}

enum Completion {
    Encoded {
        ticket: Ticket,
        result: qr_engine::Result<RgbaImage>,
    },
    LogoDecoded {
        ticket: Ticket,
        result: qr_engine::Result<LogoImage>,
    },
}

/// Requests parked until no work is in flight.
enum Waiter {
    Settle(oneshot::Sender<Snapshot>),
    Export(oneshot::Sender<std::result::Result<RgbaImage, QrEngineError>>),
}

/// Cloneable handle to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
}

impl SessionHandle {
    /// Start a session loop on the current tokio runtime.
    pub fn spawn(encoder: Arc<dyn QrEncoder>, notices: broadcast::Sender<Notice>) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let session = Session {
            pipeline: Pipeline::new(),
            encoder,
            notices,
            in_flight: 0,
            waiters: Vec::new(),
            logo_file_name: None,
        };
        tokio::spawn(session.run(rx));
        tracing::info!("QR session started");
        Self { tx }
    }

    /// Replace the current request. Any earlier run still in flight is
    /// superseded and its results will never reach the surface.
    pub async fn submit(&self, request: GenerationRequest, logo: Option<LogoOverlay>) -> Result<Ticket> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Submit {
            request,
            logo,
            reply,
        })
        .await?;
        rx.await.map_err(|_| StudioError::SessionClosed)
    }

    /// Wait until no encode or decode is in flight.
    pub async fn settle(&self) -> Result<Snapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Settle { reply }).await?;
        rx.await.map_err(|_| StudioError::SessionClosed)
    }

    /// Wait for in-flight work, then return the last composed surface.
    pub async fn export_surface(&self) -> Result<RgbaImage> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Export { reply }).await?;
        Ok(rx.await.map_err(|_| StudioError::SessionClosed)??)
    }

    async fn send(&self, cmd: Command) -> Result<()> {
        self.tx.send(cmd).await.map_err(|_| StudioError::SessionClosed)
    }
}

struct Session {
    pipeline: Pipeline,
    encoder: Arc<dyn QrEncoder>,
    notices: broadcast::Sender<Notice>,
    in_flight: usize,
    waiters: Vec<Waiter>,
    logo_file_name: Option<String>,
}

impl Session {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();

        loop {
            tokio::select! {
                cmd = rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd, &done_tx),
                    None => break,
                },
                Some(done) = done_rx.recv() => self.handle_completion(done),
            }
            self.release_waiters();
        }

        tracing::info!("QR session stopped");
    }

    fn handle_command(&mut self, cmd: Command, done_tx: &mpsc::UnboundedSender<Completion>) {
        match cmd {
            Command::Submit {
                request,
                logo,
                reply,
            } => {
                let ticket = self.start_run(request, logo, done_tx);
                let _ = reply.send(ticket);
            }
            Command::Settle { reply } => self.waiters.push(Waiter::Settle(reply)),
            Command::Export { reply } => self.waiters.push(Waiter::Export(reply)),
        }
    }

    fn start_run(
        &mut self,
        request: GenerationRequest,
        logo: Option<LogoOverlay>,
        done_tx: &mpsc::UnboundedSender<Completion>,
    ) -> Ticket {
        let ticket = self.pipeline.begin(&request);
        let size = request.pixel_size();
        self.logo_file_name = logo.as_ref().map(|l| l.file_name().to_string());

        let encoder = Arc::clone(&self.encoder);
        let done = done_tx.clone();
        self.in_flight += 1;
        let job = tokio::task::spawn_blocking(move || encoder.encode(&request));
        tokio::spawn(async move {
            // Every job reports back, panics included.
            let result = job
                .await
                .unwrap_or_else(|e| Err(QrEngineError::Encoding(format!("encoder task failed: {e}"))));
            let _ = done.send(Completion::Encoded { ticket, result });
        });

        if let Some(logo) = logo {
            let done = done_tx.clone();
            self.in_flight += 1;
            let job = tokio::task::spawn_blocking(move || logo.decode(size));
            tokio::spawn(async move {
                let result = job
                    .await
                    .unwrap_or_else(|e| Err(QrEngineError::LogoDecode(format!("decode task failed: {e}"))));
                let _ = done.send(Completion::LogoDecoded { ticket, result });
            });
        }

        ticket
    }

    fn handle_completion(&mut self, done: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match done {
            Completion::Encoded { ticket, result } => {
                match self.pipeline.complete_encode(ticket, result) {
                    Ok(Outcome::Stale) => {
                        tracing::debug!(ticket = ticket.value(), "Superseded encode discarded");
                    }
                    Ok(_) => {}
                    Err(e) => self.notify(Notice::error(format!("Could not generate QR code: {e}"))),
                }
            }
            Completion::LogoDecoded { ticket, result } => {
                match self.pipeline.complete_logo(ticket, result) {
                    Ok(Outcome::Stale) => {
                        tracing::debug!(ticket = ticket.value(), "Superseded logo discarded");
                    }
                    Ok(_) => {}
                    Err(e) => self.notify(Notice::error(format!("Could not load logo image: {e}"))),
                }
            }
        }
    }

    fn release_waiters(&mut self) {
        if self.in_flight > 0 || self.waiters.is_empty() {
            return;
        }
        for waiter in std::mem::take(&mut self.waiters) {
            match waiter {
                Waiter::Settle(reply) => {
                    let _ = reply.send(self.snapshot());
                }
                Waiter::Export(reply) => {
                    let surface = self.pipeline.exportable().map(|s| s.image().clone());
                    let _ = reply.send(surface);
                }
            }
        }
    }

    fn snapshot(&self) -> Snapshot {
        let surface = self.pipeline.surface();
        Snapshot {
            ticket: self.pipeline.latest().value(),
            state: match self.pipeline.state() {
                PipelineState::Idle => "idle",
                PipelineState::Encoding(_) => "encoding",
                PipelineState::Composed(_) => "composed",
                PipelineState::Failed(_) => "failed",
            },
            has_surface: surface.is_some(),
            surface_ticket: surface.map(|s| s.ticket().value()),
            logo_drawn: surface.is_some_and(|s| s.logo_drawn()),
            size: surface.map(|s| s.size()),
            logo_file_name: self.logo_file_name.clone(),
        }
    }

    fn notify(&self, notice: Notice) {
        tracing::warn!(message = %notice.message, "Session notice");
        let _ = self.notices.send(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use qr_engine::{ModuleEncoder, compose};

    /// Delays encoding of any request whose content starts with "slow".
    struct SlowEncoder;

    impl QrEncoder for SlowEncoder {
        fn encode(&self, request: &GenerationRequest) -> qr_engine::Result<RgbaImage> {
            if request.content().starts_with("slow") {
                std::thread::sleep(Duration::from_millis(150));
            }
            ModuleEncoder.encode(request)
        }
    }

    /// Panics on the content "crash".
    struct CrashingEncoder;

    impl QrEncoder for CrashingEncoder {
        fn encode(&self, request: &GenerationRequest) -> qr_engine::Result<RgbaImage> {
            if request.content() == "crash" {
                panic!("encoder blew up");
            }
            ModuleEncoder.encode(request)
        }
    }

    async fn settle_within(session: &SessionHandle) -> Snapshot {
        tokio::time::timeout(Duration::from_secs(5), session.settle())
            .await
            .expect("session should settle")
            .unwrap()
    }

    fn start() -> (SessionHandle, broadcast::Receiver<Notice>) {
        let (tx, rx) = broadcast::channel(16);
        (SessionHandle::spawn(Arc::new(SlowEncoder), tx), rx)
    }

    fn logo_png(rgba: [u8; 4]) -> LogoOverlay {
        let img = RgbaImage::from_pixel(40, 40, image::Rgba(rgba));
        LogoOverlay::from_bytes("logo.png", qr_engine::encode_png(&img).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn export_before_any_run_is_unavailable() {
        let (session, _rx) = start();
        let err = session.export_surface().await.unwrap_err();
        assert!(matches!(err, StudioError::Engine(QrEngineError::ExportUnavailable)));
    }

    #[tokio::test]
    async fn composes_latest_request() {
        let (session, _rx) = start();
        let req = GenerationRequest::new("hello").with_pixel_size(150).unwrap();
        let ticket = session.submit(req.clone(), None).await.unwrap();

        let snap = session.settle().await.unwrap();
        assert_eq!(snap.ticket, ticket.value());
        assert_eq!(snap.state, "composed");
        assert_eq!(snap.size, Some(150));

        let surface = session.export_surface().await.unwrap();
        assert_eq!(surface, compose(&ModuleEncoder.encode(&req).unwrap(), None, 150));
    }

    #[tokio::test]
    async fn slow_superseded_request_never_wins() {
        let (session, _rx) = start();
        let slow = GenerationRequest::new("slow request");
        let fast = GenerationRequest::new("fast request").with_pixel_size(350).unwrap();

        session.submit(slow, Some(logo_png([255, 0, 0, 255]))).await.unwrap();
        let latest = session.submit(fast.clone(), None).await.unwrap();

        let snap = session.settle().await.unwrap();
        assert_eq!(snap.surface_ticket, Some(latest.value()));
        assert!(!snap.logo_drawn);

        let surface = session.export_surface().await.unwrap();
        assert_eq!(surface, compose(&ModuleEncoder.encode(&fast).unwrap(), None, 350));
    }

    #[tokio::test]
    async fn logo_is_drawn_for_current_request() {
        let (session, _rx) = start();
        let req = GenerationRequest::new("with logo");
        let logo = logo_png([0, 0, 255, 255]);

        session.submit(req.clone(), Some(logo.clone())).await.unwrap();
        let snap = session.settle().await.unwrap();
        assert!(snap.logo_drawn);
        assert_eq!(snap.logo_file_name.as_deref(), Some("logo.png"));

        let expected = compose(
            &ModuleEncoder.encode(&req).unwrap(),
            Some(&logo.decode(256).unwrap()),
            256,
        );
        assert_eq!(session.export_surface().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn encode_failure_notifies_and_keeps_last_surface() {
        let (session, mut rx) = start();
        let good = GenerationRequest::new("good");
        let bad = GenerationRequest::new("x".repeat(4000));

        let first = session.submit(good, None).await.unwrap();
        session.settle().await.unwrap();
        session.submit(bad, None).await.unwrap();

        let snap = session.settle().await.unwrap();
        assert_eq!(snap.state, "failed");
        assert_eq!(snap.surface_ticket, Some(first.value()));

        let notice = rx.recv().await.unwrap();
        assert!(notice.message.starts_with("Could not generate QR code"));
        assert!(session.export_surface().await.is_ok());
    }

    #[tokio::test]
    async fn undecodable_logo_notifies_but_base_survives() {
        let (session, mut rx) = start();
        let logo = LogoOverlay::from_bytes("broken.png", b"nope".to_vec()).unwrap();

        session.submit(GenerationRequest::new("base"), Some(logo)).await.unwrap();
        let snap = session.settle().await.unwrap();
        assert_eq!(snap.state, "composed");
        assert!(!snap.logo_drawn);

        let notice = rx.recv().await.unwrap();
        assert!(notice.message.starts_with("Could not load logo image"));
    }

    #[tokio::test]
    async fn panicking_encoder_is_reported_and_session_keeps_running() {
        let (tx, mut rx) = broadcast::channel(16);
        let session = SessionHandle::spawn(Arc::new(CrashingEncoder), tx);

        session.submit(GenerationRequest::new("crash"), None).await.unwrap();
        let snap = settle_within(&session).await;
        assert_eq!(snap.state, "failed");
        assert!(!snap.has_surface);
        assert!(rx.recv().await.unwrap().message.contains("encoder task failed"));

        session.submit(GenerationRequest::new("crash"), None).await.unwrap();
        let latest = session.submit(GenerationRequest::new("fine"), None).await.unwrap();
        let snap = settle_within(&session).await;
        assert_eq!(snap.state, "composed");
        assert_eq!(snap.surface_ticket, Some(latest.value()));
        assert!(session.export_surface().await.is_ok());
    }
}

//! Request-sequencing state machine for the visible surface.
//!
//! Every request gets a [`Ticket`]. Encode and logo-decode results arrive
//! asynchronously, each tagged with the ticket that started them; anything
//! tagged with an older ticket than the latest is dropped without touching
//! the surface.
//!
//! ```text
//! Idle ──begin──▶ Encoding ──encode ok──▶ Composed
//!                    │                       ▲ logo drawn in place
//!                    └──encode err──▶ Failed (previous surface kept)
//! ```

use image::RgbaImage;
use tracing::{debug, warn};

use crate::compose::{clear_surface, draw_base, draw_logo};
use crate::logo::LogoImage;
use crate::request::GenerationRequest;
use crate::{QrEngineError, Result};

/// Monotonically increasing request sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Where the latest request is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing requested yet.
    Idle,
    Encoding(Ticket),
    Composed(Ticket),
    Failed(Ticket),
}

/// The result of applying one async completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Drawn onto the current surface.
    Applied,
    /// A logo that finished before its base; drawn once the base lands.
    Parked,
    /// Belongs to a superseded request; ignored.
    Stale,
}

/// The single current composed image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedSurface {
    ticket: Ticket,
    image: RgbaImage,
    logo_drawn: bool,
}

impl ComposedSurface {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn logo_drawn(&self) -> bool {
        self.logo_drawn
    }

    pub fn size(&self) -> u32 {
        self.image.width()
    }
}

/// Owns the visible surface and decides which completions may draw on it.
#[derive(Debug)]
pub struct Pipeline {
    latest: Ticket,
    pixel_size: u32,
    state: PipelineState,
    surface: Option<ComposedSurface>,
    parked_logo: Option<(Ticket, LogoImage)>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            latest: Ticket::default(),
            pixel_size: 0,
            state: PipelineState::Idle,
            surface: None,
            parked_logo: None,
        }
    }

    /// Start a run for `request`, superseding any run still in flight.
    pub fn begin(&mut self, request: &GenerationRequest) -> Ticket {
        self.latest = self.latest.next();
        self.pixel_size = request.pixel_size();
        self.state = PipelineState::Encoding(self.latest);
        self.parked_logo = None;
        debug!(ticket = self.latest.0, size = self.pixel_size, "Pipeline run started");
        self.latest
    }

    pub fn latest(&self) -> Ticket {
        self.latest
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// The surface currently on display, if anything was ever composed.
    pub fn surface(&self) -> Option<&ComposedSurface> {
        self.surface.as_ref()
    }

    /// The last successfully composed surface, for export.
    ///
    /// While a newer request is encoding, or after it failed, this is the
    /// surface from the most recent successful run.
    pub fn exportable(&self) -> Result<&ComposedSurface> {
        self.surface.as_ref().ok_or(QrEngineError::ExportUnavailable)
    }

    /// Apply an encoder result.
    ///
    /// Stale results are ignored. A failure for the latest request moves to
    /// `Failed` and keeps the previous surface on display.
    pub fn complete_encode(&mut self, ticket: Ticket, result: Result<RgbaImage>) -> Result<Outcome> {
        if ticket != self.latest {
            debug!(ticket = ticket.0, latest = self.latest.0, "Dropping stale encode result");
            return Ok(Outcome::Stale);
        }

        let bitmap = match result {
            Ok(bitmap) => bitmap,
            Err(e) => {
                warn!(ticket = ticket.0, error = %e, "QR encode failed");
                self.state = PipelineState::Failed(ticket);
                self.parked_logo = None;
                return Err(e);
            }
        };

        let mut image = clear_surface(self.pixel_size);
        draw_base(&mut image, &bitmap);

        let mut logo_drawn = false;
        if let Some((parked, logo)) = self.parked_logo.take() {
            if parked == ticket {
                draw_logo(&mut image, &logo);
                logo_drawn = true;
            }
        }

        self.surface = Some(ComposedSurface {
            ticket,
            image,
            logo_drawn,
        });
        self.state = PipelineState::Composed(ticket);
        debug!(ticket = ticket.0, logo_drawn, "Surface composed");
        Ok(Outcome::Applied)
    }

    /// Apply a logo decode result.
    ///
    /// Only the surface of the same ticket is drawn on. A decode failure
    /// leaves the base image untouched.
    pub fn complete_logo(&mut self, ticket: Ticket, result: Result<LogoImage>) -> Result<Outcome> {
        if ticket != self.latest {
            debug!(ticket = ticket.0, latest = self.latest.0, "Dropping stale logo");
            return Ok(Outcome::Stale);
        }

        let logo = match result {
            Ok(logo) => logo,
            Err(e) => {
                warn!(ticket = ticket.0, error = %e, "Logo decode failed");
                return Err(e);
            }
        };

        match self.state {
            PipelineState::Encoding(t) if t == ticket => {
                self.parked_logo = Some((ticket, logo));
                Ok(Outcome::Parked)
            }
            PipelineState::Composed(t) if t == ticket => {
                let Some(surface) = self.surface.as_mut().filter(|s| s.ticket == ticket) else {
                    return Ok(Outcome::Stale);
                };
                draw_logo(&mut surface.image, &logo);
                surface.logo_drawn = true;
                debug!(ticket = ticket.0, "Logo drawn");
                Ok(Outcome::Applied)
            }
            _ => Ok(Outcome::Stale),
        }
    }
}

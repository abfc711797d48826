//! Fixed-cadence frame sampler

use crate::frame::PixelFrame;
use crate::surface::DrawingSurface;
use crate::VideoSource;
use std::time::Duration;
use tracing::{debug, warn};

/// Draws the current video frame into a hidden surface and extracts its pixels
pub struct FrameSampler {
    surface: DrawingSurface,
    interval: Duration,
    sequence: u64,
    skipped: u64,
}

impl FrameSampler {
    /// Create a sampler with the given tick interval
    pub fn new(interval: Duration) -> Self {
        Self {
            surface: DrawingSurface::new(),
            interval,
            sequence: 0,
            skipped: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The hidden drawing surface
    pub fn surface(&self) -> &DrawingSurface {
        &self.surface
    }

    /// Frames extracted so far
    pub fn sampled(&self) -> u64 {
        self.sequence
    }

    /// Ticks that produced no frame
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Sample one frame.
    ///
    /// Returns `None` when the feed is not ready, reports zero dimensions,
    /// or drawing fails. Failures are logged and never fatal.
    pub fn sample<V: VideoSource + ?Sized>(&mut self, source: &mut V) -> Option<PixelFrame> {
        if !source.ready_state().has_current_data() {
            debug!("Video not ready ({:?}), skipping sample", source.ready_state());
            self.skipped += 1;
            return None;
        }

        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            debug!("Video reports zero dimensions, skipping sample");
            self.skipped += 1;
            return None;
        }

        self.surface.resize(width, height);
        let frame = source
            .draw_into(&mut self.surface)
            .and_then(|_| self.surface.image_data());

        match frame {
            Ok(mut frame) => {
                self.sequence += 1;
                frame.sequence = self.sequence;
                Some(frame)
            }
            Err(e) => {
                warn!("Frame sampling failed: {}", e);
                self.skipped += 1;
                None
            }
        }
    }

    /// Clear the surface
    pub fn reset(&mut self) {
        self.surface = DrawingSurface::new();
    }
}

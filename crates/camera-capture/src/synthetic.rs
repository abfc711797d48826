//! Scripted cameras and test patterns
//!
//! Stand-ins for a real webcam: the displayed frame can be swapped at any
//! time through a shared [`FeedHandle`], and the provider can be told to
//! refuse permission.

use crate::frame::PixelFrame;
use crate::surface::DrawingSurface;
use crate::{CameraConfig, CameraError, CameraProvider, CameraStream, ReadyState, VideoSource};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Skin-like tone used by the face patterns
pub const SKIN_RGB: [u8; 3] = [200, 150, 120];
/// Dark, saturated tone used for eyes/hair/background in the patterns
pub const DARK_RGB: [u8; 3] = [20, 40, 90];
/// Flat mid-gray
pub const GRAY_RGB: [u8; 3] = [128, 128, 128];

#[derive(Debug)]
struct FeedState {
    frame: PixelFrame,
    ready_state: ReadyState,
    live: bool,
    stop_count: u32,
}

/// Shared control over what a scripted camera shows
#[derive(Debug, Clone)]
pub struct FeedHandle {
    inner: Arc<Mutex<FeedState>>,
}

impl FeedHandle {
    pub fn new(frame: PixelFrame) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FeedState {
                frame,
                ready_state: ReadyState::HaveEnoughData,
                live: true,
                stop_count: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the displayed frame
    pub fn show(&self, frame: PixelFrame) {
        self.lock().frame = frame;
    }

    pub fn set_ready_state(&self, state: ReadyState) {
        self.lock().ready_state = state;
    }

    /// Whether the stream tracks are still running
    pub fn is_live(&self) -> bool {
        self.lock().live
    }

    /// How many times the tracks were stopped
    pub fn stop_count(&self) -> u32 {
        self.lock().stop_count
    }

    fn restart(&self) {
        self.lock().live = true;
    }
}

/// Camera stream that renders whatever its feed handle shows
#[derive(Debug, Clone)]
pub struct ScriptedCamera {
    feed: FeedHandle,
}

impl ScriptedCamera {
    pub fn new(frame: PixelFrame) -> Self {
        Self {
            feed: FeedHandle::new(frame),
        }
    }

    pub fn with_feed(feed: FeedHandle) -> Self {
        Self { feed }
    }

    pub fn feed(&self) -> &FeedHandle {
        &self.feed
    }
}

impl VideoSource for ScriptedCamera {
    fn ready_state(&self) -> ReadyState {
        let state = self.feed.lock();
        if state.live {
            state.ready_state
        } else {
            ReadyState::HaveNothing
        }
    }

    fn dimensions(&self) -> (u32, u32) {
        let state = self.feed.lock();
        (state.frame.width(), state.frame.height())
    }

    fn draw_into(&mut self, surface: &mut DrawingSurface) -> Result<(), CameraError> {
        let state = self.feed.lock();
        if !state.live {
            return Err(CameraError::NotInitialized);
        }
        surface.draw_frame(&state.frame)
    }
}

impl CameraStream for ScriptedCamera {
    fn stop_tracks(&mut self) {
        let mut state = self.feed.lock();
        if state.live {
            state.live = false;
            state.stop_count += 1;
            debug!("Scripted camera tracks stopped");
        }
    }

    fn is_live(&self) -> bool {
        self.feed.is_live()
    }
}

/// Provider handing out scripted cameras, optionally refusing permission
#[derive(Debug, Clone)]
pub struct ScriptedProvider {
    feed: FeedHandle,
    denial: Option<String>,
    acquisitions: Arc<Mutex<u32>>,
}

impl ScriptedProvider {
    pub fn new(feed: FeedHandle) -> Self {
        Self {
            feed,
            denial: None,
            acquisitions: Arc::new(Mutex::new(0)),
        }
    }

    /// Provider whose every acquisition fails with a permission error
    pub fn denying(reason: impl Into<String>) -> Self {
        Self {
            feed: FeedHandle::new(PixelFrame::empty()),
            denial: Some(reason.into()),
            acquisitions: Arc::new(Mutex::new(0)),
        }
    }

    pub fn feed(&self) -> &FeedHandle {
        &self.feed
    }

    /// Number of successful acquisitions
    pub fn acquisitions(&self) -> u32 {
        *self.acquisitions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CameraProvider for ScriptedProvider {
    fn acquire(&mut self, config: &CameraConfig) -> Result<Box<dyn CameraStream>, CameraError> {
        if let Some(reason) = &self.denial {
            return Err(CameraError::PermissionDenied(reason.clone()));
        }
        info!(
            "Scripted camera acquired ({}x{} ideal, {:?})",
            config.width, config.height, config.facing
        );
        self.feed.restart();
        *self.acquisitions.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(Box::new(ScriptedCamera::with_feed(self.feed.clone())))
    }
}

/// Frame filled with a single colour
pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> PixelFrame {
    let mut data = Vec::with_capacity(width as usize * height as usize * 4);
    for _ in 0..(width as usize * height as usize) {
        data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
    }
    PixelFrame::from_raw_unchecked(data, width, height)
}

/// Centered face: skin tone with a dark eye band a third of the way down
pub fn face(width: u32, height: u32) -> PixelFrame {
    let mut frame = solid(width, height, SKIN_RGB);
    let band_start = height / 3;
    let band_end = band_start + height / 6;
    for y in band_start..band_end {
        for x in 0..width {
            frame.put_pixel(x, y, DARK_RGB);
        }
    }
    frame
}

/// Face visible but without dark features (eyes not found)
pub fn no_eyes(width: u32, height: u32) -> PixelFrame {
    solid(width, height, SKIN_RGB)
}

/// Skin only in the left quarter; the center is dark and featureless
pub fn off_center_face(width: u32, height: u32) -> PixelFrame {
    let mut frame = solid(width, height, DARK_RGB);
    for y in 0..height {
        for x in 0..width / 4 {
            frame.put_pixel(x, y, SKIN_RGB);
        }
    }
    frame
}

//! Camera Capture for Interview Proctoring
//!
//! Pulls still frames out of a live webcam feed for presence analysis.
//! Supports:
//! - RGBA pixel frames (one byte per channel)
//! - A hidden drawing surface the feed is rendered into
//! - Fixed-cadence sampling with readiness guards
//! - Scripted synthetic cameras for tests and simulation

pub mod frame;
pub mod sampler;
pub mod surface;
pub mod synthetic;

pub use frame::PixelFrame;
pub use sampler::FrameSampler;
pub use surface::DrawingSurface;
pub use synthetic::{FeedHandle, ScriptedCamera, ScriptedProvider};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("Camera device busy: {0}")]
    DeviceBusy(String),

    #[error("Invalid frame format: {0}")]
    Format(String),

    #[error("Draw failed: {0}")]
    Draw(String),

    #[error("Image decode failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Camera not initialized")]
    NotInitialized,
}

/// Media readiness, mirroring the HTML media element ready states
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReadyState {
    HaveNothing = 0,
    HaveMetadata = 1,
    HaveCurrentData = 2,
    HaveFutureData = 3,
    HaveEnoughData = 4,
}

impl ReadyState {
    /// Whether a current frame can be drawn
    pub fn has_current_data(self) -> bool {
        self >= ReadyState::HaveCurrentData
    }
}

/// Which way the requested camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    #[default]
    User,
    Environment,
}

/// A live video feed that can be drawn onto a surface
pub trait VideoSource {
    /// Current readiness of the feed
    fn ready_state(&self) -> ReadyState;

    /// Intrinsic video dimensions (width, height)
    fn dimensions(&self) -> (u32, u32);

    /// Render the current frame into `surface`
    fn draw_into(&mut self, surface: &mut DrawingSurface) -> Result<(), CameraError>;
}

/// An acquired camera stream; owns the device until its tracks are stopped
pub trait CameraStream: VideoSource + Send {
    /// Release every track of the stream. Must be safe to call repeatedly.
    fn stop_tracks(&mut self);

    /// Whether any track is still live
    fn is_live(&self) -> bool;
}

/// Grants access to a camera (permission prompt + device open)
pub trait CameraProvider: Send {
    fn acquire(&mut self, config: &CameraConfig) -> Result<Box<dyn CameraStream>, CameraError>;
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Ideal capture width
    pub width: u32,
    /// Ideal capture height
    pub height: u32,
    /// Requested facing mode
    pub facing: FacingMode,
    /// Interval between sampled frames (milliseconds)
    pub sample_interval_ms: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            facing: FacingMode::User,
            sample_interval_ms: 500,
        }
    }
}

impl CameraConfig {
    /// Low-resolution config for constrained devices
    pub fn low_res() -> Self {
        Self {
            width: 320,
            height: 240,
            ..Default::default()
        }
    }

    /// Sampling interval as a `Duration`
    pub fn sample_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.sample_interval_ms)
    }
}

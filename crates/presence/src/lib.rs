//! Presence and Gaze Detection
//!
//! Cheap webcam-frame heuristics used during proctored interviews:
//! - Face presence from skin-tone, texture and brightness statistics
//! - Eye presence from dark-feature density on a detected face
//! - Camera-facing estimate from activity in the central region
//!
//! No trained model is involved; false negatives are expected and are
//! absorbed by the grace periods of the monitor.

pub mod analysis;
pub mod config;
pub mod detector;

pub use analysis::{DetectionStatus, FrameStatistics};
pub use config::ClassifierConfig;
pub use detector::{analyze_frame, PresenceClassifier};

use thiserror::Error;

/// Presence classifier error types
#[derive(Error, Debug)]
pub enum PresenceError {
    #[error("Malformed frame: {width}x{height} with {len} bytes")]
    MalformedFrame { width: u32, height: u32, len: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

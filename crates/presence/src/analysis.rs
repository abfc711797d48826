//! Frame statistics and detection results

use crate::ClassifierConfig;
use serde::{Deserialize, Serialize};

/// Outcome of one presence/gaze classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionStatus {
    /// A face-like region is in frame
    pub face_detected: bool,

    /// Dark features (eyes) found on the face
    pub eyes_detected: bool,

    /// Face is centered toward the camera
    pub looking_at_camera: bool,
}

impl DetectionStatus {
    /// All-false status (nothing detected)
    pub fn none() -> Self {
        Self::default()
    }

    /// Every check passed
    pub fn is_compliant(&self) -> bool {
        self.face_detected && self.eyes_detected && self.looking_at_camera
    }
}

/// Aggregated statistics over the sampled pixels of one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameStatistics {
    /// Number of pixels sampled
    pub sampled: usize,
    /// Mean brightness (0-255)
    pub avg_brightness: f32,
    /// Mean per-pixel RGB spread (texture proxy)
    pub avg_variance: f32,
    pub skin_ratio: f32,
    pub dark_ratio: f32,
    /// Sampled pixels inside the central circle showing skin, edges or
    /// motion, as a share of all sampled pixels
    pub center_activity: f32,
    /// Zero unless a previous frame of the same size was available
    pub motion_ratio: f32,
    pub edge_ratio: f32,
    pub uniform_ratio: f32,
}

impl FrameStatistics {
    /// Blank wall or absent subject, regardless of lighting
    pub fn is_empty_frame(&self, config: &ClassifierConfig) -> bool {
        self.uniform_ratio > config.empty_uniform_ratio
            || (self.avg_variance < config.empty_variance
                && self.skin_ratio < config.empty_skin_ratio)
    }

    /// Apply the decision thresholds
    pub fn evaluate(&self, config: &ClassifierConfig) -> DetectionStatus {
        if self.sampled == 0 {
            return DetectionStatus::none();
        }

        let face_detected = self.skin_ratio > config.min_skin_ratio
            && self.avg_variance > config.min_variance
            && self.avg_brightness > config.min_brightness
            && self.avg_brightness < config.max_brightness
            && self.uniform_ratio < config.max_uniform_ratio
            && !self.is_empty_frame(config);

        let eyes_detected = face_detected && self.dark_ratio > config.min_dark_ratio;
        let looking_at_camera = eyes_detected && self.center_activity > config.min_center_activity;

        DetectionStatus {
            face_detected,
            eyes_detected,
            looking_at_camera,
        }
    }
}

//! Classifier configuration

use crate::PresenceError;
use serde::{Deserialize, Serialize};

/// Tunable thresholds for the presence/gaze heuristics.
///
/// The defaults are empirical and usually need recalibration per camera
/// and lighting setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Sample every Nth pixel on both axes
    pub sample_stride: u32,

    /// Radius of the central region as a fraction of min(width, height)
    pub center_radius_ratio: f32,

    /// Brightness below which a pixel counts as dark (eyes, hair, shadow)
    pub dark_brightness: f32,

    /// Brightness jump against the left/upper neighbour that marks an edge
    pub edge_threshold: f32,

    /// Max RGB spread (max - min) for a pixel to count as uniform/gray
    pub uniform_tolerance: u8,

    /// Summed absolute channel delta that marks a pixel as moving
    pub motion_threshold: u32,

    /// Brightness window in which the skin rules apply
    pub skin_brightness_min: f32,
    pub skin_brightness_max: f32,

    /// Face decision: minimum skin ratio
    pub min_skin_ratio: f32,
    /// Face decision: minimum average spread (texture/contrast)
    pub min_variance: f32,
    /// Face decision: brightness window (exclusive)
    pub min_brightness: f32,
    pub max_brightness: f32,
    /// Face decision: maximum uniform ratio
    pub max_uniform_ratio: f32,

    /// Empty frame: uniform ratio above this
    pub empty_uniform_ratio: f32,
    /// Empty frame: variance below this together with skin below `empty_skin_ratio`
    pub empty_variance: f32,
    pub empty_skin_ratio: f32,

    /// Eyes decision: minimum dark ratio
    pub min_dark_ratio: f32,

    /// Gaze decision: minimum activity inside the central region
    pub min_center_activity: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            sample_stride: 8,
            center_radius_ratio: 0.3,
            dark_brightness: 100.0,
            edge_threshold: 25.0,
            uniform_tolerance: 15,
            motion_threshold: 30,
            skin_brightness_min: 40.0,
            skin_brightness_max: 230.0,
            min_skin_ratio: 0.05,
            min_variance: 20.0,
            min_brightness: 30.0,
            max_brightness: 190.0,
            max_uniform_ratio: 0.75,
            empty_uniform_ratio: 0.8,
            empty_variance: 15.0,
            empty_skin_ratio: 0.02,
            min_dark_ratio: 0.08,
            min_center_activity: 0.12,
        }
    }
}

impl ClassifierConfig {
    /// Create strict config (more evidence required)
    pub fn strict() -> Self {
        Self {
            min_skin_ratio: 0.10,
            min_variance: 25.0,
            min_dark_ratio: 0.12,
            min_center_activity: 0.15,
            ..Default::default()
        }
    }

    /// Create lenient config (dim rooms, low-quality webcams)
    pub fn lenient() -> Self {
        Self {
            min_skin_ratio: 0.03,
            min_variance: 12.0,
            min_brightness: 20.0,
            max_brightness: 210.0,
            min_dark_ratio: 0.05,
            min_center_activity: 0.08,
            ..Default::default()
        }
    }

    /// Reject configurations the classifier cannot run with
    pub fn validate(&self) -> Result<(), PresenceError> {
        if self.sample_stride == 0 {
            return Err(PresenceError::Config("sample_stride must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.center_radius_ratio) {
            return Err(PresenceError::Config(format!(
                "center_radius_ratio {} outside [0, 1]",
                self.center_radius_ratio
            )));
        }
        if self.min_brightness >= self.max_brightness {
            return Err(PresenceError::Config(format!(
                "brightness window ({}, {}) is empty",
                self.min_brightness, self.max_brightness
            )));
        }
        if self.skin_brightness_min >= self.skin_brightness_max {
            return Err(PresenceError::Config("skin brightness window is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(ClassifierConfig::default().validate().is_ok());
        assert!(ClassifierConfig::strict().validate().is_ok());
        assert!(ClassifierConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_zero_stride_rejected() {
        let config = ClassifierConfig {
            sample_stride: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PresenceError::Config(_))));
    }
}

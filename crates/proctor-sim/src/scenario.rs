//! Scenario files: a camera setup and a timeline of host actions

use crate::SimError;
use camera_capture::synthetic::{face, no_eyes, off_center_face, solid, GRAY_RGB};
use camera_capture::PixelFrame;
use focus_guard::FocusEvent;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Whether the camera permission prompt is granted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraAccess {
    #[default]
    Available,
    Denied,
}

/// One host action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Start,
    Stop,
    ResetSession,
    /// Switch the camera feed to a preset or an image file
    Show(String),
    Event(FocusEvent),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub at_ms: u64,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub camera: CameraAccess,
    pub duration_ms: u64,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_json(source: &str) -> Result<Self, SimError> {
        let mut scenario: Scenario = serde_json::from_str(source)?;
        // stable: same-time steps keep file order
        scenario.steps.sort_by_key(|step| step.at_ms);
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

/// Built-in frame presets, matched by name; anything else is an image path
pub fn load_frame(source: &str, width: u32, height: u32) -> Result<PixelFrame, SimError> {
    let frame = match source {
        "face" => face(width, height),
        "no_eyes" => no_eyes(width, height),
        "off_center" => off_center_face(width, height),
        "gray" => solid(width, height, GRAY_RGB),
        "empty" => solid(width, height, [0, 0, 0]),
        path => PixelFrame::open(path)?,
    };
    Ok(frame)
}

//! Violation types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Cause of a proctoring violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    /// Focus left the interview (tab switch, blur, blocked shortcut, ...)
    TabSwitch,
    /// Candidate not visible or not facing the camera
    CameraLookAway,
}

impl ViolationKind {
    /// Stable wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::TabSwitch => "tab-switch",
            ViolationKind::CameraLookAway => "camera-look-away",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single observed violation, consumed immediately by the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub observed_at: Instant,
}

impl Violation {
    pub fn new(kind: ViolationKind, observed_at: Instant) -> Self {
        Self { kind, observed_at }
    }

    pub fn tab_switch(observed_at: Instant) -> Self {
        Self::new(ViolationKind::TabSwitch, observed_at)
    }

    pub fn camera_look_away(observed_at: Instant) -> Self {
        Self::new(ViolationKind::CameraLookAway, observed_at)
    }
}

//! Camera branch: escalating grace periods for presence failures

use alerting::{GraceTimers, Violation};
use presence::DetectionStatus;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::info;

/// Grace periods per presence failure (milliseconds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazePolicy {
    pub face_absent_ms: u64,
    pub eyes_absent_ms: u64,
    pub gaze_away_ms: u64,
}

impl Default for GazePolicy {
    fn default() -> Self {
        Self {
            face_absent_ms: 5000,
            eyes_absent_ms: 7000,
            gaze_away_ms: 10000,
        }
    }
}

/// Most severe unmet presence condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GazeFailure {
    FaceAbsent,
    EyesAbsent,
    GazeAway,
}

impl GazeFailure {
    pub fn from_status(status: &DetectionStatus) -> Option<Self> {
        if !status.face_detected {
            Some(GazeFailure::FaceAbsent)
        } else if !status.eyes_detected {
            Some(GazeFailure::EyesAbsent)
        } else if !status.looking_at_camera {
            Some(GazeFailure::GazeAway)
        } else {
            None
        }
    }
}

impl GazePolicy {
    pub fn grace_for(&self, failure: GazeFailure) -> Duration {
        Duration::from_millis(match failure {
            GazeFailure::FaceAbsent => self.face_absent_ms,
            GazeFailure::EyesAbsent => self.eyes_absent_ms,
            GazeFailure::GazeAway => self.gaze_away_ms,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CameraSlot;

/// Single grace timer shared by all presence failures
pub struct CameraBranch {
    policy: GazePolicy,
    timers: GraceTimers<CameraSlot, GazeFailure>,
}

impl CameraBranch {
    pub fn new(policy: GazePolicy) -> Self {
        Self {
            policy,
            timers: GraceTimers::new(),
        }
    }

    /// Feed one detection tick
    pub fn observe(&mut self, status: &DetectionStatus, now: Instant) {
        match GazeFailure::from_status(status) {
            Some(failure) => {
                self.timers
                    .arm(CameraSlot, failure, now, self.policy.grace_for(failure));
            }
            None => {
                self.timers.cancel(CameraSlot);
            }
        }
    }

    /// Raise a violation if the grace timer ran out unresolved
    pub fn expire(&mut self, now: Instant) -> Option<Violation> {
        let (_, failure) = self.timers.expire(now).into_iter().next()?;
        info!("Presence failure {:?} unresolved after grace period", failure);
        Some(Violation::camera_look_away(now))
    }

    /// Failure the pending timer was armed for
    pub fn pending(&self) -> Option<GazeFailure> {
        self.timers.cause(CameraSlot).copied()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn reset(&mut self) {
        self.timers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::ViolationKind;

    fn status(face: bool, eyes: bool, looking: bool) -> DetectionStatus {
        DetectionStatus {
            face_detected: face,
            eyes_detected: eyes,
            looking_at_camera: looking,
        }
    }

    fn ms(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    #[test]
    fn test_grace_by_severity() {
        let base = Instant::now();
        for (s, grace) in [
            (status(false, false, false), 5000),
            (status(true, false, false), 7000),
            (status(true, true, false), 10000),
        ] {
            let mut branch = CameraBranch::new(GazePolicy::default());
            branch.observe(&s, base);
            assert_eq!(branch.next_deadline(), Some(ms(base, grace)));
            assert!(branch.expire(ms(base, grace - 1)).is_none());
            let violation = branch.expire(ms(base, grace)).unwrap();
            assert_eq!(violation.kind, ViolationKind::CameraLookAway);
        }
    }

    #[test]
    fn test_pending_timer_not_rearmed() {
        let base = Instant::now();
        let mut branch = CameraBranch::new(GazePolicy::default());

        branch.observe(&status(true, true, false), base);
        branch.observe(&status(false, false, false), ms(base, 500));
        assert_eq!(branch.pending(), Some(GazeFailure::GazeAway));
        assert_eq!(branch.next_deadline(), Some(ms(base, 10000)));
    }

    #[test]
    fn test_compliant_tick_cancels() {
        let base = Instant::now();
        let mut branch = CameraBranch::new(GazePolicy::default());

        branch.observe(&status(false, false, false), base);
        branch.observe(&status(true, true, true), ms(base, 4500));
        assert!(branch.pending().is_none());
        assert!(branch.expire(ms(base, 6000)).is_none());
    }
}

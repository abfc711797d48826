//! Interview monitoring session state machine
//!
//! Sans-IO: every entry point takes the current instant, so the same code
//! runs under the tokio runtime, the scenario simulator, and unit tests.

use crate::gaze::{CameraBranch, GazeFailure};
use crate::options::MonitorObserver;
use crate::settings::MonitorConfig;
use crate::ProctorError;
use alerting::{AggregateOutcome, AggregatorConfig, Violation, ViolationAggregator, WarningRecord};
use camera_capture::{CameraProvider, CameraStream, FrameSampler};
use focus_guard::{FocusEvent, FocusGuard};
use presence::{DetectionStatus, PresenceClassifier};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle phase of the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorPhase {
    Idle,
    Monitoring,
    /// Monitoring with this many warnings issued
    Warning(u32),
    Terminated,
}

/// Result of a start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Monitoring began; `camera` is false in focus-only mode
    Started { camera: bool },
    AlreadyMonitoring,
    Disabled,
    Terminated,
}

/// How the host should treat a UI event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDisposition {
    /// Call `preventDefault` + `stopPropagation`
    pub prevent_default: bool,
}

/// One proctored interview session
pub struct InterviewMonitor<O: MonitorObserver> {
    session_id: Uuid,
    config: MonitorConfig,
    observer: O,
    phase: MonitorPhase,
    is_monitoring: bool,
    detection: DetectionStatus,
    camera: Option<Box<dyn CameraStream>>,
    sampler: FrameSampler,
    classifier: PresenceClassifier,
    gaze: CameraBranch,
    guard: FocusGuard,
    aggregator: ViolationAggregator,
}

impl<O: MonitorObserver> InterviewMonitor<O> {
    /// Create an idle monitor
    pub fn new(config: MonitorConfig, observer: O) -> Result<Self, ProctorError> {
        config.validate()?;
        let classifier = PresenceClassifier::new(config.classifier.clone())?;
        let session_id = Uuid::new_v4();
        info!(
            "Interview monitor {} created (max warnings {})",
            session_id, config.options.max_warnings
        );

        Ok(Self {
            session_id,
            sampler: FrameSampler::new(config.camera.sample_interval()),
            classifier,
            gaze: CameraBranch::new(config.policy.gaze.clone()),
            guard: FocusGuard::new(config.policy.focus.clone()),
            aggregator: ViolationAggregator::new(Self::aggregator_config(&config)),
            observer,
            phase: MonitorPhase::Idle,
            is_monitoring: false,
            detection: DetectionStatus::none(),
            camera: None,
            config,
        })
    }

    fn aggregator_config(config: &MonitorConfig) -> AggregatorConfig {
        AggregatorConfig {
            max_warnings: config.options.max_warnings,
            dedup_window_ms: config.policy.dedup_window_ms,
        }
    }

    /// Begin monitoring. Camera failures degrade to focus-only monitoring.
    pub fn start_camera_monitoring(
        &mut self,
        provider: &mut dyn CameraProvider,
        now: Instant,
    ) -> StartOutcome {
        if !self.config.options.enabled {
            debug!("Monitoring disabled, ignoring start");
            return StartOutcome::Disabled;
        }
        if self.phase == MonitorPhase::Terminated {
            debug!("Session {} terminated, ignoring start", self.session_id);
            return StartOutcome::Terminated;
        }
        if self.is_monitoring {
            return StartOutcome::AlreadyMonitoring;
        }

        self.is_monitoring = true;
        self.phase = match self.aggregator.warning_count() {
            0 => MonitorPhase::Monitoring,
            n => MonitorPhase::Warning(n),
        };

        match provider.acquire(&self.config.camera) {
            Ok(stream) => {
                info!("Camera monitoring started for session {}", self.session_id);
                self.camera = Some(stream);
            }
            Err(e) => {
                warn!(
                    "Camera unavailable, continuing with focus-only monitoring: {}",
                    e
                );
            }
        }
        debug!("Monitoring started at {:?}", now);

        StartOutcome::Started {
            camera: self.camera.is_some(),
        }
    }

    /// Release the camera, clear timers and reset detection. Idempotent.
    pub fn stop_camera_monitoring(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            camera.stop_tracks();
            info!("Camera released for session {}", self.session_id);
        }
        self.gaze.reset();
        self.guard.reset();
        self.sampler.reset();
        self.classifier.reset();
        self.detection = DetectionStatus::none();

        if self.is_monitoring {
            info!("Monitoring stopped for session {}", self.session_id);
        }
        self.is_monitoring = false;
        if self.phase != MonitorPhase::Terminated {
            self.phase = MonitorPhase::Idle;
        }
    }

    /// Stop and begin a fresh session with a zero warning count
    pub fn reset_session(&mut self) {
        self.stop_camera_monitoring();
        self.aggregator = ViolationAggregator::new(Self::aggregator_config(&self.config));
        self.phase = MonitorPhase::Idle;
        self.session_id = Uuid::new_v4();
        info!("New monitoring session {}", self.session_id);
    }

    /// One detection tick: sample, classify, feed the camera branch.
    /// Sampling and classification failures are logged and skipped.
    pub fn sample_tick(&mut self, now: Instant) {
        if !self.is_monitoring || self.phase == MonitorPhase::Terminated {
            return;
        }
        let Some(camera) = self.camera.as_mut() else {
            return;
        };
        let Some(frame) = self.sampler.sample(camera.as_mut()) else {
            return;
        };

        match self.classifier.classify(&frame) {
            Ok(status) => self.on_detection(status, now),
            Err(e) => warn!("Detection failed for frame {}: {}", frame.sequence, e),
        }
    }

    /// Apply one detection result
    pub fn on_detection(&mut self, status: DetectionStatus, now: Instant) {
        if !self.is_monitoring || self.phase == MonitorPhase::Terminated {
            return;
        }
        self.detection = status;
        self.gaze.observe(&status, now);
    }

    /// Route a host UI event through the focus guard
    pub fn handle_event(&mut self, event: &FocusEvent, now: Instant) -> EventDisposition {
        if !self.is_monitoring {
            return EventDisposition::default();
        }

        let response = self.guard.handle(event, now);
        if let Some(violation) = response.violation {
            self.raise(violation);
        }
        EventDisposition {
            prevent_default: response.prevent_default,
        }
    }

    /// Fire grace timers due at `now`
    pub fn poll(&mut self, now: Instant) {
        if !self.is_monitoring || self.phase == MonitorPhase::Terminated {
            return;
        }
        if let Some(violation) = self.gaze.expire(now) {
            self.raise(violation);
        }
        for violation in self.guard.expire(now) {
            self.raise(violation);
        }
    }

    /// Earliest pending grace deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        if !self.is_monitoring || self.phase == MonitorPhase::Terminated {
            return None;
        }
        match (self.gaze.next_deadline(), self.guard.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn raise(&mut self, violation: Violation) {
        match self.aggregator.record(&violation) {
            AggregateOutcome::Warning { count } => {
                self.phase = MonitorPhase::Warning(count);
                self.observer.on_warning(violation.kind, count);
            }
            AggregateOutcome::Terminated { count } => {
                self.phase = MonitorPhase::Terminated;
                self.gaze.reset();
                self.guard.reset();
                self.observer.on_warning(violation.kind, count);
                warn!("Interview session {} terminated", self.session_id);
                self.observer.on_interview_terminated();
            }
            AggregateOutcome::Duplicate | AggregateOutcome::Ignored => {}
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn phase(&self) -> MonitorPhase {
        self.phase
    }

    pub fn warning_count(&self) -> u32 {
        self.aggregator.warning_count()
    }

    pub fn max_warnings(&self) -> u32 {
        self.aggregator.max_warnings()
    }

    pub fn is_monitoring(&self) -> bool {
        self.is_monitoring
    }

    /// Camera acquired (false in focus-only mode)
    pub fn camera_active(&self) -> bool {
        self.camera.is_some()
    }

    pub fn detection_status(&self) -> DetectionStatus {
        self.detection
    }

    /// Presence failure the camera grace timer is running for
    pub fn pending_gaze_failure(&self) -> Option<GazeFailure> {
        self.gaze.pending()
    }

    pub fn warnings(&self) -> &[WarningRecord] {
        self.aggregator.history()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }
}

impl<O: MonitorObserver> Drop for InterviewMonitor<O> {
    fn drop(&mut self) {
        self.stop_camera_monitoring();
    }
}

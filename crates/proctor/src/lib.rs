//! Interview Proctoring Monitor
//!
//! Ties the presence classifier, focus guard and violation aggregator into
//! one session object, plus a tokio runtime that drives it:
//! - `InterviewMonitor`: sans-IO session state machine fed explicit instants
//! - `MonitorRuntime`: owns the monitor, samples the camera and fires grace timers
//! - `Settings`: layered defaults, TOML file and `PROCTOR__*` environment

pub mod disposer;
pub mod gaze;
pub mod options;
pub mod runtime;
pub mod session;
pub mod settings;

pub use disposer::{Disposer, Disposers};
pub use gaze::{CameraBranch, GazeFailure, GazePolicy};
pub use options::{MonitorCallbacks, MonitorObserver, MonitorOptions};
pub use runtime::{MonitorHandle, MonitorRuntime, MonitorSnapshot, SignalSink, SignalSource};
pub use session::{EventDisposition, InterviewMonitor, MonitorPhase, StartOutcome};
pub use settings::{LoggingSettings, MonitorConfig, PolicyConfig, Settings};

use thiserror::Error;

/// Monitor error types
#[derive(Error, Debug)]
pub enum ProctorError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Presence classifier error: {0}")]
    Presence(#[from] presence::PresenceError),

    #[error("Camera error: {0}")]
    Camera(#[from] camera_capture::CameraError),

    #[error("Monitor runtime has shut down")]
    RuntimeClosed,
}

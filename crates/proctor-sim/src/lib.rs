//! Interview Monitor Scenario Simulator
//!
//! Replays scripted camera feeds and host events against an
//! `InterviewMonitor` on a virtual clock and reports the warnings raised.

pub mod runner;
pub mod scenario;

pub use runner::{run_scenario, ReportedEvent, ReportedWarning, ScenarioRunner, SimReport};
pub use scenario::{load_frame, Action, CameraAccess, Scenario, Step};

use proctor::LoggingSettings;
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Simulator error types
#[derive(Error, Debug)]
pub enum SimError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scenario parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Camera error: {0}")]
    Camera(#[from] camera_capture::CameraError),

    #[error("Monitor error: {0}")]
    Monitor(#[from] proctor::ProctorError),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Initialize logging to stderr; `verbose` forces debug level
pub fn init_logging(settings: &LoggingSettings, verbose: bool) -> Result<(), SimError> {
    let level = if verbose {
        Level::DEBUG
    } else {
        settings
            .level
            .parse::<Level>()
            .map_err(|e| SimError::Logging(e.to_string()))?
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if settings.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| SimError::Logging(e.to_string()))
}

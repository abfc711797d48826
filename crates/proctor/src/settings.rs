//! Layered settings: defaults, optional file, `PROCTOR__*` environment

use crate::gaze::GazePolicy;
use crate::options::MonitorOptions;
use crate::ProctorError;
use camera_capture::CameraConfig;
use config::{Config, Environment, File, FileFormat};
use focus_guard::GuardConfig;
use presence::ClassifierConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Violation policy: dedup window and grace periods
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Same-kind violations closer than this to the last accepted one are dropped (ms)
    pub dedup_window_ms: u64,
    pub gaze: GazePolicy,
    pub focus: GuardConfig,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            dedup_window_ms: 3000,
            gaze: GazePolicy::default(),
            focus: GuardConfig::default(),
        }
    }
}

/// Everything an `InterviewMonitor` is constructed from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub options: MonitorOptions,
    pub policy: PolicyConfig,
    pub classifier: ClassifierConfig,
    pub camera: CameraConfig,
}

impl MonitorConfig {
    /// Reject configurations a monitor cannot run with
    pub fn validate(&self) -> Result<(), ProctorError> {
        if self.options.max_warnings == 0 {
            return Err(ProctorError::InvalidSettings(
                "monitor.options.max_warnings must be at least 1".into(),
            ));
        }
        if self.camera.sample_interval_ms == 0 {
            return Err(ProctorError::InvalidSettings(
                "monitor.camera.sample_interval_ms must be > 0".into(),
            ));
        }
        self.classifier.validate()?;
        Ok(())
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Max level: trace, debug, info, warn, error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Top-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub monitor: MonitorConfig,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load defaults, then `path` (if any), then `PROCTOR__SECTION__KEY` variables
    pub fn load(path: Option<&Path>) -> Result<Self, ProctorError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(
            Environment::with_prefix("PROCTOR")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from an in-memory TOML document
    pub fn from_toml(source: &str) -> Result<Self, ProctorError> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ProctorError> {
        self.monitor.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.monitor.options.max_warnings, 3);
        assert_eq!(settings.monitor.policy.dedup_window_ms, 3000);
        assert_eq!(settings.monitor.policy.gaze.face_absent_ms, 5000);
        assert_eq!(settings.monitor.policy.focus.visibility_grace_ms, 500);
        assert_eq!(settings.monitor.camera.sample_interval_ms, 500);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_partial_override() {
        let settings = Settings::from_toml(
            r#"
            [monitor.options]
            max_warnings = 5

            [monitor.policy.gaze]
            gaze_away_ms = 15000

            [monitor.classifier]
            min_skin_ratio = 0.1
            "#,
        )
        .unwrap();

        assert_eq!(settings.monitor.options.max_warnings, 5);
        assert!(settings.monitor.options.enabled);
        assert_eq!(settings.monitor.policy.gaze.gaze_away_ms, 15000);
        assert_eq!(settings.monitor.policy.gaze.face_absent_ms, 5000);
        assert_eq!(settings.monitor.classifier.min_skin_ratio, 0.1);
        assert_eq!(settings.monitor.classifier.sample_stride, 8);
    }

    #[test]
    fn test_zero_max_warnings_rejected() {
        let result = Settings::from_toml("[monitor.options]\nmax_warnings = 0\n");
        assert!(matches!(result, Err(ProctorError::InvalidSettings(_))));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("proctor-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.logging.level, "debug");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_environment_overrides_file() {
        let path = std::env::temp_dir().join(format!("proctor-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[monitor.options]\nmax_warnings = 4\n").unwrap();

        std::env::set_var("PROCTOR__MONITOR__OPTIONS__MAX_WARNINGS", "5");
        let result = Settings::load(Some(&path));
        std::env::remove_var("PROCTOR__MONITOR__OPTIONS__MAX_WARNINGS");
        std::fs::remove_file(&path).ok();

        let settings = result.unwrap();
        assert_eq!(settings.monitor.options.max_warnings, 5);
        assert_eq!(settings.monitor.policy.dedup_window_ms, 3000);
    }

    #[test]
    fn test_zero_sample_interval_rejected() {
        let mut config = MonitorConfig::default();
        config.camera.sample_interval_ms = 0;
        assert!(matches!(config.validate(), Err(ProctorError::InvalidSettings(_))));

        let result = Settings::from_toml("[monitor.camera]\nsample_interval_ms = 0\n");
        assert!(matches!(result, Err(ProctorError::InvalidSettings(_))));
    }
}

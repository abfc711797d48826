//! Deterministic scenario replay on a virtual millisecond clock

use crate::scenario::{load_frame, Action, CameraAccess, Scenario};
use crate::SimError;
use alerting::ViolationKind;
use camera_capture::synthetic::{face, FeedHandle, ScriptedProvider};
use proctor::{InterviewMonitor, MonitorConfig, MonitorObserver, MonitorSnapshot, StartOutcome};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Observer buffering callbacks until the runner stamps them with the clock
#[derive(Debug, Default)]
pub struct BufferedObserver {
    warnings: Vec<(ViolationKind, u32)>,
    terminated: bool,
}

impl BufferedObserver {
    fn drain(&mut self) -> (Vec<(ViolationKind, u32)>, bool) {
        (
            std::mem::take(&mut self.warnings),
            std::mem::take(&mut self.terminated),
        )
    }
}

impl MonitorObserver for BufferedObserver {
    fn on_warning(&mut self, kind: ViolationKind, count: u32) {
        self.warnings.push((kind, count));
    }

    fn on_interview_terminated(&mut self) {
        self.terminated = true;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedWarning {
    pub at_ms: u64,
    pub kind: ViolationKind,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedEvent {
    pub at_ms: u64,
    pub event: String,
    pub prevent_default: bool,
}

/// Outcome of one scenario run
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub warnings: Vec<ReportedWarning>,
    pub terminated_at_ms: Option<u64>,
    pub events: Vec<ReportedEvent>,
    pub final_state: MonitorSnapshot,
}

struct Clock {
    base: Instant,
}

impl Clock {
    fn at(&self, ms: u64) -> Instant {
        self.base + Duration::from_millis(ms)
    }

    fn ms(&self, instant: Instant) -> u64 {
        let elapsed = instant.saturating_duration_since(self.base);
        // round up so a deadline is never polled early
        let ms = elapsed.as_millis() as u64;
        if elapsed > Duration::from_millis(ms) {
            ms + 1
        } else {
            ms
        }
    }
}

pub struct ScenarioRunner {
    monitor: InterviewMonitor<BufferedObserver>,
    provider: ScriptedProvider,
    feed: Option<FeedHandle>,
    clock: Clock,
    next_tick_ms: Option<u64>,
    report: Vec<ReportedWarning>,
    events: Vec<ReportedEvent>,
    terminated_at_ms: Option<u64>,
}

impl ScenarioRunner {
    pub fn new(config: MonitorConfig, camera: CameraAccess) -> Result<Self, SimError> {
        let (provider, feed) = match camera {
            CameraAccess::Available => {
                let feed = FeedHandle::new(face(config.camera.width, config.camera.height));
                (ScriptedProvider::new(feed.clone()), Some(feed))
            }
            CameraAccess::Denied => (ScriptedProvider::denying("NotAllowedError"), None),
        };
        let monitor = InterviewMonitor::new(config, BufferedObserver::default())?;

        Ok(Self {
            monitor,
            provider,
            feed,
            clock: Clock {
                base: Instant::now(),
            },
            next_tick_ms: None,
            report: Vec::new(),
            events: Vec::new(),
            terminated_at_ms: None,
        })
    }

    /// Replay `scenario`, delivering grace expiries, then actions, then the
    /// sampling tick for each instant in time order.
    pub fn run(mut self, scenario: &Scenario) -> Result<SimReport, SimError> {
        let interval_ms = self.monitor.config().camera.sample_interval_ms;
        let mut steps = scenario.steps.iter().peekable();

        loop {
            let deadline_ms = self.monitor.next_deadline().map(|d| self.clock.ms(d));
            let step_ms = steps.peek().map(|step| step.at_ms);
            let Some(t) = [deadline_ms, step_ms, self.next_tick_ms]
                .into_iter()
                .flatten()
                .min()
                .filter(|t| *t <= scenario.duration_ms)
            else {
                break;
            };
            let now = self.clock.at(t);

            self.monitor.poll(now);
            self.collect(t);

            while let Some(step) = steps.next_if(|step| step.at_ms == t) {
                self.apply(&step.action, t)?;
                self.collect(t);
            }

            if self.next_tick_ms == Some(t) {
                self.monitor.sample_tick(now);
                self.collect(t);
                self.next_tick_ms = Some(t + interval_ms);
            }
        }

        info!(
            "Scenario finished: {} warnings, terminated: {}",
            self.report.len(),
            self.terminated_at_ms.is_some()
        );
        let final_state = MonitorSnapshot::of(&self.monitor);
        Ok(SimReport {
            warnings: self.report,
            terminated_at_ms: self.terminated_at_ms,
            events: self.events,
            final_state,
        })
    }

    fn apply(&mut self, action: &Action, t: u64) -> Result<(), SimError> {
        let now = self.clock.at(t);
        debug!("t={}ms {:?}", t, action);
        match action {
            Action::Start => {
                let outcome = self.monitor.start_camera_monitoring(&mut self.provider, now);
                if outcome == (StartOutcome::Started { camera: true }) {
                    self.next_tick_ms = Some(t);
                }
            }
            Action::Stop => {
                self.monitor.stop_camera_monitoring();
                self.next_tick_ms = None;
            }
            Action::ResetSession => {
                self.monitor.reset_session();
                self.next_tick_ms = None;
                self.terminated_at_ms = None;
            }
            Action::Show(source) => {
                let camera = &self.monitor.config().camera;
                let frame = load_frame(source, camera.width, camera.height)?;
                match &self.feed {
                    Some(feed) => feed.show(frame),
                    None => debug!("No camera feed, ignoring frame {}", source),
                }
            }
            Action::Event(event) => {
                let disposition = self.monitor.handle_event(event, now);
                self.events.push(ReportedEvent {
                    at_ms: t,
                    event: format!("{:?}", event),
                    prevent_default: disposition.prevent_default,
                });
            }
        }
        Ok(())
    }

    fn collect(&mut self, t: u64) {
        let (warnings, terminated) = self.monitor.observer_mut().drain();
        self.report.extend(
            warnings
                .into_iter()
                .map(|(kind, count)| ReportedWarning { at_ms: t, kind, count }),
        );
        if terminated {
            self.terminated_at_ms = Some(t);
        }
    }
}

/// Convenience wrapper: build a runner and replay `scenario`
pub fn run_scenario(scenario: &Scenario, config: MonitorConfig) -> Result<SimReport, SimError> {
    ScenarioRunner::new(config, scenario.camera)?.run(scenario)
}

//! Tokio event loop driving an `InterviewMonitor`
//!
//! A single task owns the monitor and is its only writer. It waits on the
//! detection interval, the next grace deadline and host commands.

use crate::disposer::{Disposer, Disposers};
use crate::options::MonitorObserver;
use crate::session::{EventDisposition, InterviewMonitor, MonitorPhase, StartOutcome};
use crate::ProctorError;
use camera_capture::CameraProvider;
use focus_guard::FocusEvent;
use presence::DetectionStatus;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

/// Point-in-time view of the monitor state, published after every change
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSnapshot {
    pub session_id: Uuid,
    pub phase: MonitorPhase,
    pub warning_count: u32,
    pub max_warnings: u32,
    pub is_monitoring: bool,
    pub camera_active: bool,
    pub detection_status: DetectionStatus,
}

impl MonitorSnapshot {
    pub fn of<O: MonitorObserver>(monitor: &InterviewMonitor<O>) -> Self {
        Self {
            session_id: monitor.session_id(),
            phase: monitor.phase(),
            warning_count: monitor.warning_count(),
            max_warnings: monitor.max_warnings(),
            is_monitoring: monitor.is_monitoring(),
            camera_active: monitor.camera_active(),
            detection_status: monitor.detection_status(),
        }
    }
}

enum Command {
    Start(oneshot::Sender<MonitorSnapshot>),
    Stop(oneshot::Sender<MonitorSnapshot>),
    ResetSession(oneshot::Sender<MonitorSnapshot>),
    Event(FocusEvent, oneshot::Sender<EventDisposition>),
    Shutdown,
}

/// Host-side handle. Dropping every handle shuts the runtime down.
#[derive(Clone)]
pub struct MonitorHandle {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<MonitorSnapshot>,
}

impl MonitorHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ProctorError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| ProctorError::RuntimeClosed)?;
        rx.await.map_err(|_| ProctorError::RuntimeClosed)
    }

    /// Start camera monitoring (no-op if already running or disabled)
    pub async fn start(&self) -> Result<MonitorSnapshot, ProctorError> {
        self.request(Command::Start).await
    }

    /// Stop monitoring, releasing the camera and detaching signal sources
    pub async fn stop(&self) -> Result<MonitorSnapshot, ProctorError> {
        self.request(Command::Stop).await
    }

    /// Stop and begin a fresh session
    pub async fn reset_session(&self) -> Result<MonitorSnapshot, ProctorError> {
        self.request(Command::ResetSession).await
    }

    /// Deliver a host UI event and learn whether to prevent its default action
    pub async fn dispatch(&self, event: FocusEvent) -> Result<EventDisposition, ProctorError> {
        self.request(|tx| Command::Event(event, tx)).await
    }

    /// Stop the runtime task
    pub async fn shutdown(&self) -> Result<(), ProctorError> {
        self.commands
            .send(Command::Shutdown)
            .await
            .map_err(|_| ProctorError::RuntimeClosed)
    }

    /// Latest published state
    pub fn snapshot(&self) -> MonitorSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<MonitorSnapshot> {
        self.snapshot.clone()
    }
}

/// Event entry point handed to signal sources; does not keep the runtime alive
#[derive(Clone)]
pub struct SignalSink {
    commands: mpsc::WeakSender<Command>,
}

impl SignalSink {
    pub async fn dispatch(&self, event: FocusEvent) -> Result<EventDisposition, ProctorError> {
        let commands = self.commands.upgrade().ok_or(ProctorError::RuntimeClosed)?;
        let (tx, rx) = oneshot::channel();
        commands
            .send(Command::Event(event, tx))
            .await
            .map_err(|_| ProctorError::RuntimeClosed)?;
        rx.await.map_err(|_| ProctorError::RuntimeClosed)
    }
}

/// A host event source (visibility, focus, pointer, keyboard listeners).
///
/// Attached when monitoring starts; the returned disposer detaches it and
/// runs on every stop path.
pub trait SignalSource: Send {
    fn name(&self) -> &'static str;

    fn attach(&mut self, sink: SignalSink) -> Disposer;
}

fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn wait_until(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending::<()>().await,
    }
}

/// Owns the monitor, the camera provider and the signal sources
pub struct MonitorRuntime<O: MonitorObserver> {
    monitor: InterviewMonitor<O>,
    provider: Box<dyn CameraProvider>,
    sources: Vec<Box<dyn SignalSource>>,
    disposers: Disposers,
    commands: mpsc::Receiver<Command>,
    weak_commands: mpsc::WeakSender<Command>,
    snapshot: watch::Sender<MonitorSnapshot>,
    ticker: Option<Interval>,
}

impl<O: MonitorObserver + 'static> MonitorRuntime<O> {
    pub fn new(
        monitor: InterviewMonitor<O>,
        provider: impl CameraProvider + 'static,
    ) -> (Self, MonitorHandle) {
        let (tx, rx) = mpsc::channel(64);
        let (snapshot_tx, snapshot_rx) = watch::channel(MonitorSnapshot::of(&monitor));

        let runtime = Self {
            monitor,
            provider: Box::new(provider),
            sources: Vec::new(),
            disposers: Disposers::new(),
            commands: rx,
            weak_commands: tx.downgrade(),
            snapshot: snapshot_tx,
            ticker: None,
        };
        let handle = MonitorHandle {
            commands: tx,
            snapshot: snapshot_rx,
        };
        (runtime, handle)
    }

    /// Register a host event source, attached on every start
    pub fn with_signal_source(mut self, source: impl SignalSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Run on the current tokio runtime
    pub fn spawn(self) -> JoinHandle<InterviewMonitor<O>> {
        tokio::spawn(self.run())
    }

    /// Event loop. Returns the monitor, stopped, once shut down or when
    /// every handle is dropped.
    pub async fn run(mut self) -> InterviewMonitor<O> {
        info!("Monitor runtime started for session {}", self.monitor.session_id());

        loop {
            let deadline = self.monitor.next_deadline();
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.apply(command),
                },
                _ = next_tick(&mut self.ticker) => {
                    let now = now();
                    self.monitor.poll(now);
                    self.monitor.sample_tick(now);
                    self.publish();
                }
                _ = wait_until(deadline) => {
                    self.monitor.poll(now());
                    self.publish();
                }
            }
        }

        self.teardown();
        self.publish();
        info!("Monitor runtime stopped for session {}", self.monitor.session_id());
        self.monitor
    }

    fn apply(&mut self, command: Command) {
        let now = now();
        match command {
            Command::Start(reply) => {
                let outcome = self
                    .monitor
                    .start_camera_monitoring(self.provider.as_mut(), now);
                if let StartOutcome::Started { camera } = outcome {
                    self.attach_sources();
                    if camera {
                        let mut ticker =
                            tokio::time::interval(self.monitor.config().camera.sample_interval());
                        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                        self.ticker = Some(ticker);
                    }
                }
                debug!("Start request: {:?}", outcome);
                let _ = reply.send(self.publish());
            }
            Command::Stop(reply) => {
                self.teardown();
                let _ = reply.send(self.publish());
            }
            Command::ResetSession(reply) => {
                self.teardown();
                self.monitor.reset_session();
                let _ = reply.send(self.publish());
            }
            Command::Event(event, reply) => {
                let disposition = self.monitor.handle_event(&event, now);
                self.publish();
                let _ = reply.send(disposition);
            }
            Command::Shutdown => {}
        }
    }

    fn attach_sources(&mut self) {
        for source in &mut self.sources {
            let sink = SignalSink {
                commands: self.weak_commands.clone(),
            };
            let disposer = source.attach(sink);
            self.disposers.push(source.name(), disposer);
            debug!("Signal source {} attached", source.name());
        }
    }

    fn teardown(&mut self) {
        self.ticker = None;
        self.disposers.dispose_all();
        self.monitor.stop_camera_monitoring();
    }

    fn publish(&self) -> MonitorSnapshot {
        let snapshot = MonitorSnapshot::of(&self.monitor);
        self.snapshot.send_replace(snapshot.clone());
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MonitorConfig;
    use alerting::ViolationKind;
    use camera_capture::synthetic::{face, solid, FeedHandle, ScriptedProvider, GRAY_RGB};
    use focus_guard::KeyStroke;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct Log {
        warnings: Vec<(ViolationKind, u32)>,
        terminations: u32,
    }

    #[derive(Clone, Default)]
    struct SharedRecorder(Arc<Mutex<Log>>);

    impl SharedRecorder {
        fn warnings(&self) -> Vec<(ViolationKind, u32)> {
            self.0.lock().unwrap().warnings.clone()
        }

        fn terminations(&self) -> u32 {
            self.0.lock().unwrap().terminations
        }
    }

    impl MonitorObserver for SharedRecorder {
        fn on_warning(&mut self, kind: ViolationKind, count: u32) {
            self.0.lock().unwrap().warnings.push((kind, count));
        }

        fn on_interview_terminated(&mut self) {
            self.0.lock().unwrap().terminations += 1;
        }
    }

    #[derive(Clone, Default)]
    struct TestSource {
        sink: Arc<Mutex<Option<SignalSink>>>,
        detached: Arc<AtomicU32>,
    }

    impl SignalSource for TestSource {
        fn name(&self) -> &'static str {
            "test-listeners"
        }

        fn attach(&mut self, sink: SignalSink) -> Disposer {
            *self.sink.lock().unwrap() = Some(sink);
            let slot = self.sink.clone();
            let detached = self.detached.clone();
            Box::new(move || {
                slot.lock().unwrap().take();
                detached.fetch_add(1, Ordering::SeqCst);
            })
        }
    }

    fn spawn(
        provider: ScriptedProvider,
    ) -> (MonitorHandle, SharedRecorder, JoinHandle<InterviewMonitor<SharedRecorder>>) {
        let recorder = SharedRecorder::default();
        let monitor = InterviewMonitor::new(MonitorConfig::default(), recorder.clone()).unwrap();
        let (runtime, handle) = MonitorRuntime::new(monitor, provider);
        (handle, recorder, runtime.spawn())
    }

    fn key(k: &str) -> FocusEvent {
        FocusEvent::KeyDown(KeyStroke::new(k))
    }

    #[tokio::test(start_paused = true)]
    async fn test_face_absent_raises_camera_warning() {
        let feed = FeedHandle::new(solid(160, 120, GRAY_RGB));
        let (handle, recorder, task) = spawn(ScriptedProvider::new(feed.clone()));

        let snapshot = handle.start().await.unwrap();
        assert!(snapshot.is_monitoring);
        assert!(snapshot.camera_active);

        tokio::time::sleep(Duration::from_millis(4800)).await;
        assert!(recorder.warnings().is_empty());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(recorder.warnings(), vec![(ViolationKind::CameraLookAway, 1)]);
        assert_eq!(handle.snapshot().warning_count, 1);
        assert_eq!(handle.snapshot().phase, MonitorPhase::Warning(1));

        handle.shutdown().await.unwrap();
        let monitor = task.await.unwrap();
        assert!(!monitor.is_monitoring());
        assert!(!feed.is_live());
    }

    #[tokio::test(start_paused = true)]
    async fn test_compliant_feed_stays_clean() {
        let feed = FeedHandle::new(face(160, 120));
        let (handle, recorder, _task) = spawn(ScriptedProvider::new(feed));

        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert!(recorder.warnings().is_empty());
        assert!(handle.snapshot().detection_status.looking_at_camera);
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_only_when_permission_denied() {
        let (handle, recorder, _task) = spawn(ScriptedProvider::denying("NotAllowedError"));

        let snapshot = handle.start().await.unwrap();
        assert!(snapshot.is_monitoring);
        assert!(!snapshot.camera_active);

        let disposition = handle.dispatch(key("F12")).await.unwrap();
        assert!(disposition.prevent_default);
        assert_eq!(recorder.warnings(), vec![(ViolationKind::TabSwitch, 1)]);
        assert_eq!(handle.snapshot().warning_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tab_hidden_past_grace() {
        let feed = FeedHandle::new(face(160, 120));
        let (handle, recorder, _task) = spawn(ScriptedProvider::new(feed));
        handle.start().await.unwrap();

        handle
            .dispatch(FocusEvent::VisibilityChanged { hidden: true })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        handle
            .dispatch(FocusEvent::VisibilityChanged { hidden: false })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(recorder.warnings(), vec![(ViolationKind::TabSwitch, 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminates_after_max_warnings() {
        let feed = FeedHandle::new(face(160, 120));
        let (handle, recorder, _task) = spawn(ScriptedProvider::new(feed));
        handle.start().await.unwrap();

        for _ in 0..4 {
            handle.dispatch(FocusEvent::ContextMenu).await.unwrap();
            tokio::time::sleep(Duration::from_millis(3100)).await;
        }

        assert_eq!(recorder.terminations(), 1);
        assert_eq!(recorder.warnings().len(), 3);
        assert_eq!(handle.snapshot().phase, MonitorPhase::Terminated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sources_detached_on_stop() {
        let feed = FeedHandle::new(face(160, 120));
        let recorder = SharedRecorder::default();
        let monitor = InterviewMonitor::new(MonitorConfig::default(), recorder.clone()).unwrap();
        let source = TestSource::default();
        let (runtime, handle) = MonitorRuntime::new(monitor, ScriptedProvider::new(feed.clone()));
        let _task = runtime.with_signal_source(source.clone()).spawn();

        handle.start().await.unwrap();
        let sink = source.sink.lock().unwrap().clone().unwrap();
        let disposition = sink.dispatch(key("F5")).await.unwrap();
        assert!(disposition.prevent_default);
        assert_eq!(recorder.warnings(), vec![(ViolationKind::TabSwitch, 1)]);

        let snapshot = handle.stop().await.unwrap();
        assert!(!snapshot.is_monitoring);
        assert_eq!(snapshot.detection_status, DetectionStatus::none());
        assert!(source.sink.lock().unwrap().is_none());
        assert!(!feed.is_live());

        handle.stop().await.unwrap();
        assert_eq!(source.detached.load(Ordering::SeqCst), 1);

        // restart reattaches
        handle.start().await.unwrap();
        assert!(source.sink.lock().unwrap().is_some());
        assert!(feed.is_live());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_releases_camera() {
        let feed = FeedHandle::new(face(160, 120));
        let (handle, _recorder, task) = spawn(ScriptedProvider::new(feed.clone()));
        handle.start().await.unwrap();
        assert!(feed.is_live());

        drop(handle);
        let monitor = task.await.unwrap();
        assert!(!monitor.is_monitoring());
        assert!(!feed.is_live());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_runtime_reports_error() {
        let feed = FeedHandle::new(face(16, 16));
        let (handle, _recorder, task) = spawn(ScriptedProvider::new(feed));
        handle.shutdown().await.unwrap();
        task.await.unwrap();

        assert!(matches!(handle.start().await, Err(ProctorError::RuntimeClosed)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_serializes_camel_case() {
        let (handle, _recorder, _task) = spawn(ScriptedProvider::denying("NotAllowedError"));
        let snapshot = handle.start().await.unwrap();

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["warningCount"], 0);
        assert_eq!(json["maxWarnings"], 3);
        assert_eq!(json["cameraActive"], false);
        assert_eq!(json["phase"], "monitoring");
    }
}

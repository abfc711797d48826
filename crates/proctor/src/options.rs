//! Construction options and the host callback contract

use alerting::ViolationKind;
use serde::{Deserialize, Serialize};

/// Options supplied by the embedding host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorOptions {
    /// Warnings after which the interview is terminated
    pub max_warnings: u32,
    /// When false, starting the monitor is a no-op
    pub enabled: bool,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            max_warnings: 3,
            enabled: true,
        }
    }
}

/// Receives the two outward-facing signals of the monitor
pub trait MonitorObserver: Send {
    /// An accepted violation; `count` is the new warning count
    fn on_warning(&mut self, kind: ViolationKind, count: u32);

    /// The warning limit was reached. Called at most once per session.
    fn on_interview_terminated(&mut self);
}

impl<T: MonitorObserver + ?Sized> MonitorObserver for Box<T> {
    fn on_warning(&mut self, kind: ViolationKind, count: u32) {
        (**self).on_warning(kind, count)
    }

    fn on_interview_terminated(&mut self) {
        (**self).on_interview_terminated()
    }
}

type WarningCallback = Box<dyn FnMut(ViolationKind, u32) + Send>;
type TerminationCallback = Box<dyn FnMut() + Send>;

/// Observer built from two closures
pub struct MonitorCallbacks {
    on_warning: WarningCallback,
    on_interview_terminated: TerminationCallback,
}

impl MonitorCallbacks {
    pub fn new<W, T>(on_warning: W, on_interview_terminated: T) -> Self
    where
        W: FnMut(ViolationKind, u32) + Send + 'static,
        T: FnMut() + Send + 'static,
    {
        Self {
            on_warning: Box::new(on_warning),
            on_interview_terminated: Box::new(on_interview_terminated),
        }
    }
}

impl MonitorObserver for MonitorCallbacks {
    fn on_warning(&mut self, kind: ViolationKind, count: u32) {
        (self.on_warning)(kind, count)
    }

    fn on_interview_terminated(&mut self) {
        (self.on_interview_terminated)()
    }
}

impl std::fmt::Debug for MonitorCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorCallbacks").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_callbacks_forward() {
        let warnings = Arc::new(Mutex::new(Vec::new()));
        let terminated = Arc::new(Mutex::new(0));

        let w = warnings.clone();
        let t = terminated.clone();
        let mut callbacks: Box<dyn MonitorObserver> = Box::new(MonitorCallbacks::new(
            move |kind, count| w.lock().unwrap().push((kind, count)),
            move || *t.lock().unwrap() += 1,
        ));

        callbacks.on_warning(ViolationKind::TabSwitch, 1);
        callbacks.on_interview_terminated();

        assert_eq!(*warnings.lock().unwrap(), vec![(ViolationKind::TabSwitch, 1)]);
        assert_eq!(*terminated.lock().unwrap(), 1);
    }

    #[test]
    fn test_default_options() {
        let options = MonitorOptions::default();
        assert_eq!(options.max_warnings, 3);
        assert!(options.enabled);
    }
}

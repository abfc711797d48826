//! Violation Aggregator Implementation

use crate::violation::{Violation, ViolationKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Aggregator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Warnings after which the interview is terminated (default: 3)
    pub max_warnings: u32,
    /// Same-kind violations closer than this to the last accepted one are dropped (ms)
    pub dedup_window_ms: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_warnings: 3,
            dedup_window_ms: 3000,
        }
    }
}

impl AggregatorConfig {
    pub fn dedup_window(&self) -> Duration {
        Duration::from_millis(self.dedup_window_ms)
    }
}

/// Result of feeding one violation to the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOutcome {
    /// Same kind accepted too recently; nothing changes
    Duplicate,
    /// Session already terminated; nothing changes
    Ignored,
    /// Warning issued with the new count
    Warning { count: u32 },
    /// Final warning issued; the session is now terminated
    Terminated { count: u32 },
}

impl AggregateOutcome {
    /// Whether the warning counter moved
    pub fn is_accepted(&self) -> bool {
        matches!(
            self,
            AggregateOutcome::Warning { .. } | AggregateOutcome::Terminated { .. }
        )
    }
}

/// An accepted warning, kept for the session report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningRecord {
    pub kind: ViolationKind,
    pub count: u32,
    pub issued_at: DateTime<Utc>,
}

/// Monotonic warning counter with per-kind deduplication and a one-shot
/// termination latch
pub struct ViolationAggregator {
    config: AggregatorConfig,
    warning_count: u32,
    last_accepted: HashMap<ViolationKind, Instant>,
    terminated: bool,
    history: Vec<WarningRecord>,
}

impl ViolationAggregator {
    /// Create a new aggregator
    pub fn new(config: AggregatorConfig) -> Self {
        info!("Creating violation aggregator with config: {:?}", config);
        Self {
            config,
            warning_count: 0,
            last_accepted: HashMap::new(),
            terminated: false,
            history: Vec::new(),
        }
    }

    /// Feed a violation
    pub fn record(&mut self, violation: &Violation) -> AggregateOutcome {
        let kind = violation.kind;
        metrics::counter!("proctor_violations_total", "kind" => kind.as_str()).increment(1);

        if self.terminated {
            debug!("Violation {} ignored: session terminated", kind);
            return AggregateOutcome::Ignored;
        }

        if let Some(last) = self.last_accepted.get(&kind) {
            let since = violation.observed_at.saturating_duration_since(*last);
            if since < self.config.dedup_window() {
                debug!("Violation {} suppressed: {:?} since last accepted", kind, since);
                return AggregateOutcome::Duplicate;
            }
        }

        self.last_accepted.insert(kind, violation.observed_at);
        self.warning_count += 1;
        self.history.push(WarningRecord {
            kind,
            count: self.warning_count,
            issued_at: Utc::now(),
        });
        metrics::counter!("proctor_warnings_total", "kind" => kind.as_str()).increment(1);

        if self.warning_count >= self.config.max_warnings {
            self.terminated = true;
            metrics::counter!("proctor_terminations_total").increment(1);
            warn!(
                "Warning {}/{} ({}): terminating interview",
                self.warning_count, self.config.max_warnings, kind
            );
            AggregateOutcome::Terminated {
                count: self.warning_count,
            }
        } else {
            info!(
                "Warning {}/{} recorded: {}",
                self.warning_count, self.config.max_warnings, kind
            );
            AggregateOutcome::Warning {
                count: self.warning_count,
            }
        }
    }

    pub fn warning_count(&self) -> u32 {
        self.warning_count
    }

    pub fn max_warnings(&self) -> u32 {
        self.config.max_warnings
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Accepted warnings in order
    pub fn history(&self) -> &[WarningRecord] {
        &self.history
    }
}

impl Default for ViolationAggregator {
    fn default() -> Self {
        Self::new(AggregatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    #[test]
    fn test_deduplication() {
        let base = Instant::now();
        let mut aggregator = ViolationAggregator::default();

        assert_eq!(
            aggregator.record(&Violation::tab_switch(base)),
            AggregateOutcome::Warning { count: 1 }
        );
        assert_eq!(
            aggregator.record(&Violation::tab_switch(at(base, 2999))),
            AggregateOutcome::Duplicate
        );
        assert_eq!(aggregator.warning_count(), 1);

        assert_eq!(
            aggregator.record(&Violation::tab_switch(at(base, 3000))),
            AggregateOutcome::Warning { count: 2 }
        );
    }

    #[test]
    fn test_dedup_is_per_kind() {
        let base = Instant::now();
        let mut aggregator = ViolationAggregator::default();

        aggregator.record(&Violation::tab_switch(base));
        let outcome = aggregator.record(&Violation::camera_look_away(at(base, 100)));
        assert_eq!(outcome, AggregateOutcome::Warning { count: 2 });
    }

    #[test]
    fn test_dropped_violation_does_not_extend_window() {
        let base = Instant::now();
        let mut aggregator = ViolationAggregator::default();

        aggregator.record(&Violation::tab_switch(base));
        aggregator.record(&Violation::tab_switch(at(base, 2000)));
        let outcome = aggregator.record(&Violation::tab_switch(at(base, 3500)));
        assert_eq!(outcome, AggregateOutcome::Warning { count: 2 });
    }

    #[test]
    fn test_terminates_exactly_once() {
        let base = Instant::now();
        let mut aggregator = ViolationAggregator::default();

        aggregator.record(&Violation::tab_switch(base));
        aggregator.record(&Violation::tab_switch(at(base, 4000)));
        assert_eq!(
            aggregator.record(&Violation::tab_switch(at(base, 8000))),
            AggregateOutcome::Terminated { count: 3 }
        );
        assert!(aggregator.is_terminated());

        assert_eq!(
            aggregator.record(&Violation::tab_switch(at(base, 12000))),
            AggregateOutcome::Ignored
        );
        assert_eq!(aggregator.warning_count(), 3);
        assert_eq!(aggregator.history().len(), 3);
    }

    #[test]
    fn test_custom_max_warnings() {
        let config = AggregatorConfig {
            max_warnings: 1,
            ..Default::default()
        };
        let mut aggregator = ViolationAggregator::new(config);
        let outcome = aggregator.record(&Violation::camera_look_away(Instant::now()));
        assert_eq!(outcome, AggregateOutcome::Terminated { count: 1 });
        assert!(outcome.is_accepted());
    }
}

//! Violation Alerting
//!
//! Turns raw proctoring violations into warnings: per-kind deduplication,
//! a monotonic warning counter, a one-shot termination latch, and the
//! grace-period timer table used by the detectors.

mod aggregator;
mod timers;
mod violation;

pub use aggregator::{AggregateOutcome, AggregatorConfig, ViolationAggregator, WarningRecord};
pub use timers::GraceTimers;
pub use violation::{Violation, ViolationKind};

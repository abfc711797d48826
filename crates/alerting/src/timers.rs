//! Grace-period timer table
//!
//! One pending timer per slot. Arming an occupied slot is a no-op, so a
//! slot can never hold two timers at once.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct PendingTimer<C> {
    cause: C,
    armed_at: Instant,
    deadline: Instant,
}

/// Slot-keyed one-shot timers driven by explicit instants
#[derive(Debug, Clone)]
pub struct GraceTimers<S, C> {
    pending: HashMap<S, PendingTimer<C>>,
}

impl<S, C> Default for GraceTimers<S, C> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }
}

impl<S, C> GraceTimers<S, C>
where
    S: Copy + Eq + Hash + Debug,
    C: Clone + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `slot` to fire after `delay`. Returns false if already pending.
    pub fn arm(&mut self, slot: S, cause: C, now: Instant, delay: Duration) -> bool {
        if self.pending.contains_key(&slot) {
            return false;
        }
        debug!("Grace timer {:?} armed for {:?} ({:?})", slot, delay, cause);
        self.pending.insert(
            slot,
            PendingTimer {
                cause,
                armed_at: now,
                deadline: now + delay,
            },
        );
        true
    }

    /// Cancel `slot`, returning its cause if it was pending
    pub fn cancel(&mut self, slot: S) -> Option<C> {
        let timer = self.pending.remove(&slot)?;
        debug!("Grace timer {:?} cancelled ({:?})", slot, timer.cause);
        Some(timer.cause)
    }

    pub fn is_pending(&self, slot: S) -> bool {
        self.pending.contains_key(&slot)
    }

    /// Cause recorded when `slot` was armed
    pub fn cause(&self, slot: S) -> Option<&C> {
        self.pending.get(&slot).map(|t| &t.cause)
    }

    /// When `slot` was armed
    pub fn armed_at(&self, slot: S) -> Option<Instant> {
        self.pending.get(&slot).map(|t| t.armed_at)
    }

    /// Remove and return every timer due at `now`, earliest first
    pub fn expire(&mut self, now: Instant) -> Vec<(S, C)> {
        let mut due: Vec<(S, Instant)> = self
            .pending
            .iter()
            .filter(|(_, t)| t.deadline <= now)
            .map(|(slot, t)| (*slot, t.deadline))
            .collect();
        due.sort_by_key(|(_, deadline)| *deadline);

        due.into_iter()
            .filter_map(|(slot, _)| self.pending.remove(&slot).map(|t| (slot, t.cause)))
            .collect()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|t| t.deadline).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Cancel everything
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

//! Focus and input guard state machine

use crate::event::FocusEvent;
use crate::shortcuts::blocked_shortcut;
use alerting::{GraceTimers, Violation, ViolationKind};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Guard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Grace before a hidden/blurred page counts as a tab switch (ms)
    pub visibility_grace_ms: u64,
    /// Returning after being away longer than this is reported again (ms)
    pub return_penalty_ms: u64,
    /// Grace before a pointer outside the viewport counts (ms)
    pub pointer_grace_ms: u64,
    /// Intercept developer-tools / navigation shortcuts
    pub block_shortcuts: bool,
    /// Intercept the context menu
    pub block_context_menu: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            visibility_grace_ms: 500,
            return_penalty_ms: 1000,
            pointer_grace_ms: 2000,
            block_shortcuts: true,
            block_context_menu: true,
        }
    }
}

/// Timer slots owned by the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardSlot {
    Visibility,
    Pointer,
}

/// What the host should do with an event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuardResponse {
    /// Call `preventDefault` + `stopPropagation`
    pub prevent_default: bool,
    /// Violation raised immediately by this event
    pub violation: Option<Violation>,
}

impl GuardResponse {
    fn pass() -> Self {
        Self::default()
    }

    fn block(violation: Violation) -> Self {
        Self {
            prevent_default: true,
            violation: Some(violation),
        }
    }

    fn raise(violation: Option<Violation>) -> Self {
        Self {
            prevent_default: false,
            violation,
        }
    }
}

/// Camera-independent detector for tab switches and blocked input
pub struct FocusGuard {
    config: GuardConfig,
    timers: GraceTimers<GuardSlot, ViolationKind>,
    /// Set while the document is hidden or the window blurred
    away_since: Option<Instant>,
    hidden: bool,
    blurred: bool,
    pointer_outside: bool,
}

impl FocusGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self {
            config,
            timers: GraceTimers::new(),
            away_since: None,
            hidden: false,
            blurred: false,
            pointer_outside: false,
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Page currently hidden or blurred
    pub fn is_away(&self) -> bool {
        self.away_since.is_some()
    }

    /// Process one host event
    pub fn handle(&mut self, event: &FocusEvent, now: Instant) -> GuardResponse {
        match event {
            FocusEvent::VisibilityChanged { hidden: true } => {
                self.hidden = true;
                self.on_leave(now);
                GuardResponse::pass()
            }
            FocusEvent::WindowBlur => {
                self.blurred = true;
                self.on_leave(now);
                GuardResponse::pass()
            }
            FocusEvent::VisibilityChanged { hidden: false } => {
                self.hidden = false;
                GuardResponse::raise(self.on_return(now))
            }
            FocusEvent::WindowFocus => {
                self.blurred = false;
                GuardResponse::raise(self.on_return(now))
            }
            FocusEvent::MouseLeave { x, y, viewport } => {
                if viewport.is_at_edge(*x, *y) {
                    self.pointer_outside = true;
                    self.timers.arm(
                        GuardSlot::Pointer,
                        ViolationKind::TabSwitch,
                        now,
                        Duration::from_millis(self.config.pointer_grace_ms),
                    );
                }
                GuardResponse::pass()
            }
            FocusEvent::MouseEnter => {
                self.pointer_outside = false;
                self.timers.cancel(GuardSlot::Pointer);
                GuardResponse::pass()
            }
            FocusEvent::KeyDown(stroke) => {
                if !self.config.block_shortcuts {
                    return GuardResponse::pass();
                }
                match blocked_shortcut(stroke) {
                    Some(shortcut) => {
                        info!("Blocked shortcut {}", shortcut.name);
                        GuardResponse::block(Violation::tab_switch(now))
                    }
                    None => GuardResponse::pass(),
                }
            }
            FocusEvent::ContextMenu => {
                if !self.config.block_context_menu {
                    return GuardResponse::pass();
                }
                info!("Blocked context menu");
                GuardResponse::block(Violation::tab_switch(now))
            }
        }
    }

    fn on_leave(&mut self, now: Instant) {
        if self.away_since.is_none() {
            debug!("Page hidden/blurred");
            self.away_since = Some(now);
        }
        self.timers.arm(
            GuardSlot::Visibility,
            ViolationKind::TabSwitch,
            now,
            Duration::from_millis(self.config.visibility_grace_ms),
        );
    }

    /// Back only once the document is visible and the window focused
    fn on_return(&mut self, now: Instant) -> Option<Violation> {
        if self.hidden || self.blurred {
            debug!("Still away (hidden: {}, blurred: {})", self.hidden, self.blurred);
            return None;
        }
        self.timers.cancel(GuardSlot::Visibility);
        let since = self.away_since.take()?;
        let away = now.saturating_duration_since(since);
        debug!("Page visible again after {:?}", away);

        if away > Duration::from_millis(self.config.return_penalty_ms) {
            info!("Returned after {:?} away", away);
            Some(Violation::tab_switch(now))
        } else {
            None
        }
    }

    /// Fire grace timers due at `now`
    pub fn expire(&mut self, now: Instant) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (slot, kind) in self.timers.expire(now) {
            let still_violating = match slot {
                GuardSlot::Visibility => self.away_since.is_some(),
                GuardSlot::Pointer => self.pointer_outside,
            };
            if still_violating {
                info!("Grace period for {:?} elapsed", slot);
                violations.push(Violation::new(kind, now));
            }
        }
        violations
    }

    /// Earliest pending grace deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Clear away state and all timers
    pub fn reset(&mut self) {
        self.timers.clear();
        self.away_since = None;
        self.hidden = false;
        self.blurred = false;
        self.pointer_outside = false;
    }
}

impl Default for FocusGuard {
    fn default() -> Self {
        Self::new(GuardConfig::default())
    }
}

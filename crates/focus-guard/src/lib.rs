//! Focus and Input Guard
//!
//! Detects a candidate leaving the interview without relying on the camera:
//! - Page hidden or window blurred beyond a short grace period
//! - Returning after a long absence
//! - Pointer leaving the viewport beyond a longer grace period
//! - Blocked developer-tools / navigation shortcuts and the context menu

pub mod event;
pub mod guard;
pub mod shortcuts;

pub use event::{FocusEvent, KeyStroke, Viewport};
pub use guard::{FocusGuard, GuardConfig, GuardResponse, GuardSlot};
pub use shortcuts::{blocked_shortcut, BlockedShortcut, BLOCKED_SHORTCUTS};

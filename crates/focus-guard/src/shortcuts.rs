//! Keyboard shortcuts blocked during an interview

use crate::event::KeyStroke;

/// A shortcut that is intercepted, blocked and reported
#[derive(Debug, Clone, Copy)]
pub struct BlockedShortcut {
    /// Human-readable combo, used in logs
    pub name: &'static str,
    key: &'static str,
    ctrl: bool,
    shift: bool,
    alt: bool,
}

impl BlockedShortcut {
    const fn new(name: &'static str, key: &'static str, ctrl: bool, shift: bool, alt: bool) -> Self {
        Self {
            name,
            key,
            ctrl,
            shift,
            alt,
        }
    }

    /// Required modifiers pressed and key equal (case-insensitive).
    /// Extra modifiers do not prevent a match.
    pub fn matches(&self, stroke: &KeyStroke) -> bool {
        stroke.key.eq_ignore_ascii_case(self.key)
            && (!self.ctrl || stroke.ctrl)
            && (!self.shift || stroke.shift)
            && (!self.alt || stroke.alt)
    }
}

/// Blocked combos, most specific first
pub const BLOCKED_SHORTCUTS: &[BlockedShortcut] = &[
    // window / tab switching
    BlockedShortcut::new("Alt+Tab", "Tab", false, false, true),
    BlockedShortcut::new("Ctrl+Shift+Tab", "Tab", true, true, false),
    BlockedShortcut::new("Ctrl+Tab", "Tab", true, false, false),
    BlockedShortcut::new("Alt+F4", "F4", false, false, true),
    // developer tools
    BlockedShortcut::new("F12", "F12", false, false, false),
    BlockedShortcut::new("Ctrl+Shift+I", "i", true, true, false),
    BlockedShortcut::new("Ctrl+Shift+J", "j", true, true, false),
    BlockedShortcut::new("Ctrl+Shift+C", "c", true, true, false),
    BlockedShortcut::new("Ctrl+U", "u", true, false, false),
    // save / print / reload
    BlockedShortcut::new("Ctrl+S", "s", true, false, false),
    BlockedShortcut::new("Ctrl+P", "p", true, false, false),
    BlockedShortcut::new("Ctrl+Shift+R", "r", true, true, false),
    BlockedShortcut::new("Ctrl+R", "r", true, false, false),
    BlockedShortcut::new("F5", "F5", false, false, false),
    BlockedShortcut::new("Ctrl+Shift+Delete", "Delete", true, true, false),
];

/// The blocked shortcut `stroke` triggers, if any
pub fn blocked_shortcut(stroke: &KeyStroke) -> Option<&'static BlockedShortcut> {
    BLOCKED_SHORTCUTS.iter().find(|s| s.matches(stroke))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(stroke: KeyStroke) -> Option<&'static str> {
        blocked_shortcut(&stroke).map(|s| s.name)
    }

    #[test]
    fn test_blocked_combos() {
        assert_eq!(name(KeyStroke::new("Tab").alt()), Some("Alt+Tab"));
        assert_eq!(name(KeyStroke::new("Tab").ctrl()), Some("Ctrl+Tab"));
        assert_eq!(name(KeyStroke::new("Tab").ctrl().shift()), Some("Ctrl+Shift+Tab"));
        assert_eq!(name(KeyStroke::new("F12")), Some("F12"));
        assert_eq!(name(KeyStroke::new("I").ctrl().shift()), Some("Ctrl+Shift+I"));
        assert_eq!(name(KeyStroke::new("j").ctrl().shift()), Some("Ctrl+Shift+J"));
        assert_eq!(name(KeyStroke::new("C").ctrl().shift()), Some("Ctrl+Shift+C"));
        assert_eq!(name(KeyStroke::new("u").ctrl()), Some("Ctrl+U"));
        assert_eq!(name(KeyStroke::new("s").ctrl()), Some("Ctrl+S"));
        assert_eq!(name(KeyStroke::new("p").ctrl()), Some("Ctrl+P"));
        assert_eq!(name(KeyStroke::new("r").ctrl()), Some("Ctrl+R"));
        assert_eq!(name(KeyStroke::new("R").ctrl().shift()), Some("Ctrl+Shift+R"));
        assert_eq!(name(KeyStroke::new("F5")), Some("F5"));
        assert_eq!(name(KeyStroke::new("Delete").ctrl().shift()), Some("Ctrl+Shift+Delete"));
        assert_eq!(name(KeyStroke::new("F4").alt()), Some("Alt+F4"));
    }

    #[test]
    fn test_ordinary_keys_pass() {
        assert_eq!(name(KeyStroke::new("Tab")), None);
        assert_eq!(name(KeyStroke::new("i").ctrl()), None);
        assert_eq!(name(KeyStroke::new("c").ctrl()), None);
        assert_eq!(name(KeyStroke::new("Delete")), None);
        assert_eq!(name(KeyStroke::new("F4")), None);
        assert_eq!(name(KeyStroke::new("a")), None);
    }
}

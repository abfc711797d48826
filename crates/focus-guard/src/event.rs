//! Host UI events the guard listens to

use serde::{Deserialize, Serialize};

/// Viewport size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Pointer at or beyond any edge
    pub fn is_at_edge(&self, x: f64, y: f64) -> bool {
        x <= 0.0 || y <= 0.0 || x >= self.width || y >= self.height
    }
}

/// A key press with its modifier state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStroke {
    /// Key name as reported by the host ("Tab", "F12", "i", ...)
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

impl KeyStroke {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }
}

/// Focus, visibility, pointer and keyboard signals from the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FocusEvent {
    /// Document visibility changed
    VisibilityChanged { hidden: bool },
    /// Window lost focus
    WindowBlur,
    /// Window regained focus
    WindowFocus,
    /// Pointer left the document at client position (x, y)
    MouseLeave { x: f64, y: f64, viewport: Viewport },
    /// Pointer re-entered the document
    MouseEnter,
    /// Key pressed (capture phase)
    KeyDown(KeyStroke),
    /// Context menu requested (right click)
    ContextMenu,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_edges() {
        let viewport = Viewport::new(1280.0, 720.0);
        assert!(viewport.is_at_edge(0.0, 300.0));
        assert!(viewport.is_at_edge(640.0, -4.0));
        assert!(viewport.is_at_edge(1280.0, 300.0));
        assert!(viewport.is_at_edge(640.0, 720.0));
        assert!(!viewport.is_at_edge(640.0, 360.0));
    }

    #[test]
    fn test_event_json_shape() {
        let event: FocusEvent =
            serde_json::from_str(r#"{"type":"key_down","key":"F12"}"#).unwrap();
        assert_eq!(event, FocusEvent::KeyDown(KeyStroke::new("F12")));

        let event: FocusEvent =
            serde_json::from_str(r#"{"type":"visibility_changed","hidden":true}"#).unwrap();
        assert_eq!(event, FocusEvent::VisibilityChanged { hidden: true });
    }
}

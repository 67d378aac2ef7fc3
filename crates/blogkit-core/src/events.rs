//! Input events dispatched into a page.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  EventTarget: where a listener is registered                 │
//! │  ├── Window: scroll                                          │
//! │  ├── Document: document-wide click / keydown / drag moves    │
//! │  └── Node(id): element listeners, bubbling up to Document    │
//! │                                                              │
//! │  Event: kind + target + pointer data + key + flags           │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dom::NodeId;

/// Kinds of events the page behaviors listen for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    MouseMove,
    MouseEnter,
    MouseLeave,
    MouseDown,
    MouseUp,
    TouchStart,
    TouchMove,
    TouchEnd,
    Click,
    KeyDown,
    Input,
    Blur,
    Submit,
    Scroll,
}

impl EventKind {
    /// Whether the event propagates from its target to ancestors
    pub fn bubbles(self) -> bool {
        !matches!(
            self,
            EventKind::MouseEnter | EventKind::MouseLeave | EventKind::Blur | EventKind::Scroll
        )
    }

    /// DOM event type name
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::MouseMove => "mousemove",
            EventKind::MouseEnter => "mouseenter",
            EventKind::MouseLeave => "mouseleave",
            EventKind::MouseDown => "mousedown",
            EventKind::MouseUp => "mouseup",
            EventKind::TouchStart => "touchstart",
            EventKind::TouchMove => "touchmove",
            EventKind::TouchEnd => "touchend",
            EventKind::Click => "click",
            EventKind::KeyDown => "keydown",
            EventKind::Input => "input",
            EventKind::Blur => "blur",
            EventKind::Submit => "submit",
            EventKind::Scroll => "scroll",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a listener lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    Window,
    Document,
    Node(NodeId),
}

/// A point in client (viewport) coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One event in flight
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventKind,
    /// Innermost node the event was dispatched at, if any
    pub target: Option<NodeId>,
    /// Mouse position for mouse events
    pub client: Option<Point>,
    /// Active touch points for touch events
    pub touches: Vec<Point>,
    /// Key name for keyboard events
    pub key: Option<String>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            target: None,
            client: None,
            touches: Vec::new(),
            key: None,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn mouse(kind: EventKind, x: f64, y: f64) -> Self {
        Self {
            client: Some(Point::new(x, y)),
            ..Self::new(kind)
        }
    }

    pub fn touch(kind: EventKind, touches: Vec<Point>) -> Self {
        Self {
            touches,
            ..Self::new(kind)
        }
    }

    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::new(EventKind::KeyDown)
        }
    }

    /// Pointer position: the mouse coordinate, else the first touch point.
    ///
    /// `None` for events that carry neither (e.g. a `touchend` with an
    /// empty touch list).
    pub fn pointer(&self) -> Option<Point> {
        self.client.or_else(|| self.touches.first().copied())
    }

    pub fn is_key(&self, key: &str) -> bool {
        self.key.as_deref() == Some(key)
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// What the host learns after a dispatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub default_prevented: bool,
    pub propagation_stopped: bool,
    /// How many listeners ran
    pub handled: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_prefers_mouse_then_touch() {
        let mouse = Event::mouse(EventKind::MouseMove, 3.0, 4.0);
        assert_eq!(mouse.pointer(), Some(Point::new(3.0, 4.0)));

        let touch = Event::touch(EventKind::TouchMove, vec![Point::new(9.0, 1.0), Point::new(0.0, 0.0)]);
        assert_eq!(touch.pointer(), Some(Point::new(9.0, 1.0)));

        let bare = Event::touch(EventKind::TouchEnd, Vec::new());
        assert_eq!(bare.pointer(), None);
    }

    #[test]
    fn test_non_bubbling_kinds() {
        assert!(EventKind::Click.bubbles());
        assert!(EventKind::Input.bubbles());
        assert!(!EventKind::MouseEnter.bubbles());
        assert!(!EventKind::Blur.bubbles());
    }

    #[test]
    fn test_kind_serde_names() {
        let kind: EventKind = serde_json::from_str("\"touch_start\"").unwrap();
        assert_eq!(kind, EventKind::TouchStart);
        assert_eq!(kind.to_string(), "touchstart");
    }
}

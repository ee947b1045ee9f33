use crate::bridge::ViewportState;
use serde::{Deserialize, Serialize};

/// Listener category, the equivalent of a DOM event type string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    PointerMove,
    Resize,
}

/// A host event delivered to subscribed listeners.
///
/// Hosts translate their native events (winit window events, test scripts)
/// into these, so scene code never depends on a windowing crate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Pointer moved to the given position, in logical pixels from the
    /// top-left corner of the viewport.
    PointerMoved { client_x: f32, client_y: f32 },
    /// Viewport changed size or pixel density.
    Resized(ViewportState),
}

impl InputEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PointerMoved { .. } => EventKind::PointerMove,
            Self::Resized(_) => EventKind::Resize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kinds() {
        let moved = InputEvent::PointerMoved {
            client_x: 1.0,
            client_y: 2.0,
        };
        assert_eq!(moved.kind(), EventKind::PointerMove);
        let resized = InputEvent::Resized(ViewportState::new(800.0, 600.0, 1.0));
        assert_eq!(resized.kind(), EventKind::Resize);
    }
}

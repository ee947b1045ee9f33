use crate::event::{EventKind, InputEvent};
use crate::hub::{EventHub, ListenerId};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;

/// Device pixel ratios above this are clamped when sizing render surfaces.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Logical pixels per normalized pointer unit.
const POINTER_UNIT: f32 = 100.0;

/// Viewport size in logical pixels plus the device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::new(1280.0, 720.0, 1.0)
    }
}

impl ViewportState {
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// `width / height`, or `None` for a zero-height viewport.
    pub fn aspect(&self) -> Option<f32> {
        (self.height > 0.0).then(|| self.width / self.height)
    }

    /// Device pixel ratio capped at [`MAX_PIXEL_RATIO`].
    pub fn pixel_ratio(&self) -> f32 {
        if self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio.min(MAX_PIXEL_RATIO)
        } else {
            1.0
        }
    }

    /// Render surface size in physical pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        let ratio = self.pixel_ratio();
        let scale = |v: f32| (v.max(0.0) * ratio).round() as u32;
        (scale(self.width), scale(self.height))
    }
}

/// Pointer offset from the viewport center, in units of 100 logical pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
}

impl PointerState {
    pub fn from_client(client_x: f32, client_y: f32, viewport: &ViewportState) -> Self {
        let (cx, cy) = viewport.center();
        Self {
            x: (client_x - cx) / POINTER_UNIT,
            y: (client_y - cy) / POINTER_UNIT,
        }
    }
}

/// Listener handles owned by one attached bridge.
///
/// Dropping a subscription without calling [`Subscription::unsubscribe`]
/// leaves the listeners registered.
#[must_use = "listeners stay registered until the subscription is unsubscribed"]
#[derive(Debug)]
pub struct Subscription {
    listeners: Vec<ListenerId>,
}

impl Subscription {
    /// Remove every listener this subscription added. Returns how many were
    /// still registered.
    pub fn unsubscribe(self, hub: &mut EventHub) -> usize {
        self.listeners
            .into_iter()
            .filter(|id| hub.remove_listener(*id))
            .count()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

/// Shared pointer and viewport state for one session.
///
/// Listener closures and the frame loop hold clones of the same cells, so the
/// frame always reads the most recent write.
#[derive(Debug, Clone)]
pub struct InputBridge {
    pointer: Rc<Cell<PointerState>>,
    viewport: Rc<Cell<ViewportState>>,
    resize_pending: Rc<Cell<bool>>,
}

impl InputBridge {
    pub fn new(viewport: ViewportState) -> Self {
        Self {
            pointer: Rc::new(Cell::new(PointerState::default())),
            viewport: Rc::new(Cell::new(viewport)),
            resize_pending: Rc::new(Cell::new(false)),
        }
    }

    /// Register pointer-move and resize listeners on `hub`.
    pub fn attach(&self, hub: &mut EventHub) -> Subscription {
        let pointer = self.pointer.clone();
        let viewport = self.viewport.clone();
        let on_move = hub.add_listener(EventKind::PointerMove, move |event| {
            if let InputEvent::PointerMoved { client_x, client_y } = *event {
                pointer.set(PointerState::from_client(client_x, client_y, &viewport.get()));
            }
        });

        let viewport = self.viewport.clone();
        let pending = self.resize_pending.clone();
        let on_resize = hub.add_listener(EventKind::Resize, move |event| {
            if let InputEvent::Resized(next) = *event {
                viewport.set(next);
                pending.set(true);
            }
        });

        Subscription {
            listeners: vec![on_move, on_resize],
        }
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer.get()
    }

    pub fn viewport(&self) -> ViewportState {
        self.viewport.get()
    }

    /// Latest viewport if a resize arrived since the last call.
    pub fn take_resize(&self) -> Option<ViewportState> {
        self.resize_pending
            .replace(false)
            .then(|| self.viewport.get())
    }

    /// Re-arm a resize that could not be applied this frame.
    pub fn defer_resize(&self) {
        self.resize_pending.set(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moved(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerMoved {
            client_x: x,
            client_y: y,
        }
    }

    #[test]
    fn pointer_is_normalized_from_center() {
        let mut hub = EventHub::new();
        let bridge = InputBridge::new(ViewportState::new(1920.0, 1080.0, 1.0));
        let _sub = bridge.attach(&mut hub);

        hub.dispatch(&moved(960.0, 540.0));
        assert_eq!(bridge.pointer(), PointerState { x: 0.0, y: 0.0 });

        hub.dispatch(&moved(1160.0, 440.0));
        assert_eq!(bridge.pointer(), PointerState { x: 2.0, y: -1.0 });
    }

    #[test]
    fn last_write_wins() {
        let mut hub = EventHub::new();
        let bridge = InputBridge::new(ViewportState::new(800.0, 600.0, 1.0));
        let _sub = bridge.attach(&mut hub);
        hub.dispatch(&moved(0.0, 0.0));
        hub.dispatch(&moved(500.0, 300.0));
        hub.dispatch(&moved(600.0, 400.0));
        assert_eq!(bridge.pointer(), PointerState { x: 2.0, y: 1.0 });
    }

    #[test]
    fn resize_moves_the_pointer_center() {
        let mut hub = EventHub::new();
        let bridge = InputBridge::new(ViewportState::new(800.0, 600.0, 1.0));
        let _sub = bridge.attach(&mut hub);

        hub.dispatch(&InputEvent::Resized(ViewportState::new(400.0, 200.0, 1.0)));
        hub.dispatch(&moved(200.0, 100.0));
        assert_eq!(bridge.pointer(), PointerState::default());
    }

    #[test]
    fn resize_is_taken_once() {
        let mut hub = EventHub::new();
        let bridge = InputBridge::new(ViewportState::default());
        let _sub = bridge.attach(&mut hub);
        assert!(bridge.take_resize().is_none());

        let next = ViewportState::new(1024.0, 768.0, 2.0);
        hub.dispatch(&InputEvent::Resized(next));
        assert_eq!(bridge.viewport(), next);
        assert_eq!(bridge.take_resize(), Some(next));
        assert!(bridge.take_resize().is_none());

        bridge.defer_resize();
        assert_eq!(bridge.take_resize(), Some(next));
    }

    #[test]
    fn unsubscribe_removes_all_listeners() {
        let mut hub = EventHub::new();
        let bridge = InputBridge::new(ViewportState::default());
        let sub = bridge.attach(&mut hub);
        assert_eq!(sub.len(), 2);
        assert_eq!(hub.listener_count(), 2);

        assert_eq!(sub.unsubscribe(&mut hub), 2);
        assert_eq!(hub.listener_count(), 0);

        hub.dispatch(&moved(10.0, 10.0));
        assert_eq!(bridge.pointer(), PointerState::default());
    }

    #[test]
    fn pixel_size_caps_ratio_at_two() {
        assert_eq!(ViewportState::new(1920.0, 1080.0, 1.0).pixel_size(), (1920, 1080));
        assert_eq!(ViewportState::new(800.0, 600.0, 1.5).pixel_size(), (1200, 900));
        assert_eq!(ViewportState::new(800.0, 600.0, 3.0).pixel_size(), (1600, 1200));
        assert_eq!(ViewportState::new(800.0, 600.0, 0.0).pixel_ratio(), 1.0);
    }

    #[test]
    fn aspect_of_empty_viewport() {
        assert_eq!(ViewportState::new(100.0, 0.0, 1.0).aspect(), None);
        assert_eq!(ViewportState::new(100.0, 50.0, 1.0).aspect(), Some(2.0));
    }
}

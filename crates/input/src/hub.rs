use crate::event::{EventKind, InputEvent};
use std::collections::BTreeMap;
use std::fmt;

/// Handle returned by [`EventHub::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

type Callback = Box<dyn FnMut(&InputEvent)>;

struct Listener {
    kind: EventKind,
    callback: Callback,
}

/// Listener registry standing in for the host window/document.
///
/// Single-threaded: callbacks run synchronously inside [`EventHub::dispatch`]
/// in registration order and must return quickly.
#[derive(Default)]
pub struct EventHub {
    listeners: BTreeMap<ListenerId, Listener>,
    next_id: u64,
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("listeners", &self.listeners.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&InputEvent) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.insert(
            id,
            Listener {
                kind,
                callback: Box::new(callback),
            },
        );
        tracing::trace!(?kind, id = id.0, "listener added");
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let removed = self.listeners.remove(&id).is_some();
        if removed {
            tracing::trace!(id = id.0, "listener removed");
        }
        removed
    }

    /// Deliver an event to every listener of its kind. Returns how many ran.
    pub fn dispatch(&mut self, event: &InputEvent) -> usize {
        let kind = event.kind();
        let mut delivered = 0;
        for listener in self.listeners.values_mut().filter(|l| l.kind == kind) {
            (listener.callback)(event);
            delivered += 1;
        }
        delivered
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn listener_count_for(&self, kind: EventKind) -> usize {
        self.listeners.values().filter(|l| l.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn dispatch_reaches_matching_kind_only() {
        let mut hub = EventHub::new();
        let moves = Rc::new(Cell::new(0));
        let resizes = Rc::new(Cell::new(0));

        let m = moves.clone();
        hub.add_listener(EventKind::PointerMove, move |_| m.set(m.get() + 1));
        let r = resizes.clone();
        hub.add_listener(EventKind::Resize, move |_| r.set(r.get() + 1));

        let delivered = hub.dispatch(&InputEvent::PointerMoved {
            client_x: 0.0,
            client_y: 0.0,
        });
        assert_eq!(delivered, 1);
        assert_eq!(moves.get(), 1);
        assert_eq!(resizes.get(), 0);
    }

    #[test]
    fn removed_listener_is_not_called() {
        let mut hub = EventHub::new();
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let id = hub.add_listener(EventKind::PointerMove, move |_| c.set(c.get() + 1));

        assert!(hub.remove_listener(id));
        assert!(!hub.remove_listener(id));
        hub.dispatch(&InputEvent::PointerMoved {
            client_x: 1.0,
            client_y: 1.0,
        });
        assert_eq!(calls.get(), 0);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn listener_counts_per_kind() {
        let mut hub = EventHub::new();
        hub.add_listener(EventKind::PointerMove, |_| {});
        hub.add_listener(EventKind::PointerMove, |_| {});
        hub.add_listener(EventKind::Resize, |_| {});
        assert_eq!(hub.listener_count(), 3);
        assert_eq!(hub.listener_count_for(EventKind::PointerMove), 2);
        assert_eq!(hub.listener_count_for(EventKind::Resize), 1);
    }
}

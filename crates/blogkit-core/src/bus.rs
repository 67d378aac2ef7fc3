//! Listener registry for page events.
//!
//! The bus only stores registrations; [`Page::dispatch`](crate::Page::dispatch)
//! walks the propagation path and invokes them. Every attach and detach is
//! counted so that paired registrations (drag sessions) can be checked for
//! leaks.

use std::fmt;
use std::rc::Rc;

use crate::events::{Event, EventKind, EventTarget};
use crate::page::Page;

/// A registered callback. Receives the whole page mutably.
pub type Listener = Rc<dyn Fn(&mut Page, &mut Event)>;

/// Handle returned by [`EventBus::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Running totals of registrations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    pub attached: u64,
    pub detached: u64,
}

impl ListenerStats {
    /// Registrations currently alive
    pub fn live(&self) -> u64 {
        self.attached - self.detached
    }
}

struct Registration {
    id: ListenerId,
    target: EventTarget,
    kind: EventKind,
    listener: Listener,
}

/// Registry of listeners keyed by target and event kind
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    registrations: Vec<Registration>,
    stats: ListenerStats,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("registrations", &self.registrations.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(
        &mut self,
        target: EventTarget,
        kind: EventKind,
        listener: impl Fn(&mut Page, &mut Event) + 'static,
    ) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.registrations.push(Registration {
            id,
            target,
            kind,
            listener: Rc::new(listener),
        });
        self.stats.attached += 1;
        id
    }

    /// Remove a registration; `false` if it was already gone
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.id != id);
        let removed = self.registrations.len() != before;
        if removed {
            self.stats.detached += 1;
        }
        removed
    }

    pub fn is_registered(&self, id: ListenerId) -> bool {
        self.registrations.iter().any(|r| r.id == id)
    }

    /// Snapshot of the listeners for one target and kind, in registration order
    pub fn listeners_for(&self, target: EventTarget, kind: EventKind) -> Vec<(ListenerId, Listener)> {
        self.registrations
            .iter()
            .filter(|r| r.target == target && r.kind == kind)
            .map(|r| (r.id, Rc::clone(&r.listener)))
            .collect()
    }

    pub fn listener_count(&self, target: EventTarget, kind: EventKind) -> usize {
        self.registrations
            .iter()
            .filter(|r| r.target == target && r.kind == kind)
            .count()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn stats(&self) -> ListenerStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_detach_accounting() {
        let mut bus = EventBus::new();
        let a = bus.add_listener(EventTarget::Document, EventKind::MouseMove, |_, _| {});
        let b = bus.add_listener(EventTarget::Document, EventKind::MouseUp, |_, _| {});
        assert_eq!(bus.listener_count(EventTarget::Document, EventKind::MouseMove), 1);
        assert_eq!(bus.stats().live(), 2);

        assert!(bus.remove_listener(a));
        assert!(!bus.remove_listener(a));
        assert!(bus.remove_listener(b));

        assert_eq!(bus.stats(), ListenerStats { attached: 2, detached: 2 });
        assert!(bus.is_empty());
    }

    #[test]
    fn test_snapshot_is_filtered_by_target_and_kind() {
        let mut bus = EventBus::new();
        bus.add_listener(EventTarget::Window, EventKind::Scroll, |_, _| {});
        bus.add_listener(EventTarget::Document, EventKind::Scroll, |_, _| {});
        bus.add_listener(EventTarget::Window, EventKind::Click, |_, _| {});
        assert_eq!(bus.listeners_for(EventTarget::Window, EventKind::Scroll).len(), 1);
    }
}

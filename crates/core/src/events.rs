//! Event bus - synchronous publish/subscribe for [`GameEvent`]s
//!
//! Listeners run in subscription order on the publishing thread. A listener
//! that panics is caught and logged; the remaining listeners still receive
//! the event and the panicking one stays subscribed.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::types::GameEvent;

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&GameEvent)>;

#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener; returns false if it was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver one event to every listener
    pub fn publish(&mut self, event: &GameEvent) {
        for (id, listener) in &mut self.listeners {
            let result = catch_unwind(AssertUnwindSafe(|| listener(event)));
            if result.is_err() {
                log::warn!(
                    "event listener {:?} panicked while handling {}",
                    id,
                    event.name()
                );
            }
        }
    }

    /// Deliver a batch of events in order
    pub fn publish_all<'a>(&mut self, events: impl IntoIterator<Item = &'a GameEvent>) {
        for event in events {
            self.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn listeners_receive_events_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let sink = Rc::clone(&seen);
        bus.subscribe(move |e| sink.borrow_mut().push(e.name()));

        bus.publish_all(&[GameEvent::GraceEnded, GameEvent::PressureCritical]);
        assert_eq!(*seen.borrow(), vec!["grace_ended", "pressure_critical"]);
    }

    #[test]
    fn panicking_listener_does_not_block_others() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        bus.subscribe(|_| panic!("listener failure"));
        let sink = Rc::clone(&count);
        bus.subscribe(move |_| *sink.borrow_mut() += 1);

        bus.publish(&GameEvent::StateChanged);
        bus.publish(&GameEvent::StateChanged);
        assert_eq!(*count.borrow(), 2);
        assert_eq!(bus.listener_count(), 2);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let sink = Rc::clone(&count);
        let id = bus.subscribe(move |_| *sink.borrow_mut() += 1);

        bus.publish(&GameEvent::StateChanged);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&GameEvent::StateChanged);
        assert_eq!(*count.borrow(), 1);
    }
}

//! Entity-scoped event bus
//!
//! Synchronous publish/subscribe with ordered delivery. Handlers run in
//! subscription order on the emitting thread, and teardown is explicit via
//! `unsubscribe`. There is no queueing and no reliance on garbage-collected
//! listener cleanup.

use crate::id::SubscriberId;

/// Handler invoked for every emitted event
pub type Handler<E> = Box<dyn FnMut(&E)>;

/// Synchronous, ordered publish/subscribe bus
pub struct EventBus<E> {
    handlers: Vec<(SubscriberId, Handler<E>)>,
    next_id: u64,
}

impl<E> EventBus<E> {
    /// Create an empty bus
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            next_id: 1,
        }
    }

    /// Subscribe a handler, returning its ID for later unsubscription
    pub fn subscribe(&mut self, handler: impl FnMut(&E) + 'static) -> SubscriberId {
        let id = SubscriberId::new(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Remove a handler
    ///
    /// Returns false if the ID was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _)| *handler_id != id);
        self.handlers.len() != before
    }

    /// Deliver an event to all handlers in subscription order
    pub fn emit(&mut self, event: &E) {
        for (_, handler) in self.handlers.iter_mut() {
            handler(event);
        }
    }

    /// Get the number of subscribed handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if no handlers are subscribed
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_ordered_delivery() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut bus: EventBus<u32> = EventBus::new();

        let first = order.clone();
        bus.subscribe(move |value| first.borrow_mut().push(("first", *value)));
        let second = order.clone();
        bus.subscribe(move |value| second.borrow_mut().push(("second", *value)));

        bus.emit(&7);

        assert_eq!(*order.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut bus: EventBus<()> = EventBus::new();

        let counter = count.clone();
        let id = bus.subscribe(move |_| *counter.borrow_mut() += 1);

        bus.emit(&());
        assert!(bus.unsubscribe(id));
        bus.emit(&());

        assert_eq!(*count.borrow(), 1);
        assert!(!bus.unsubscribe(id));
    }
}

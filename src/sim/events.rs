//! Typed publish/subscribe
//!
//! Handlers are keyed by event and removed through the [`Subscription`]
//! returned at registration, never by comparing closures.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Handle returned by [`EventBus::on`] / [`EventBus::once`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription<E> {
    event: E,
    id: u64,
}

impl<E: Copy> Subscription<E> {
    pub fn event(&self) -> E {
        self.event
    }
}

struct Registration<H> {
    id: u64,
    once: bool,
    handler: H,
}

/// Event bus generic over the event key `E` and the handler payload `H`
pub struct EventBus<E, H> {
    handlers: HashMap<E, Vec<Registration<H>>>,
    next_id: u64,
}

impl<E, H> Default for EventBus<E, H> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
            next_id: 1,
        }
    }
}

impl<E, H> EventBus<E, H>
where
    E: Copy + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler that stays until removed with [`off`](Self::off)
    pub fn on(&mut self, event: E, handler: H) -> Subscription<E> {
        self.register(event, handler, false)
    }

    /// Register a handler that is dropped after its first invocation
    pub fn once(&mut self, event: E, handler: H) -> Subscription<E> {
        self.register(event, handler, true)
    }

    fn register(&mut self, event: E, handler: H, once: bool) -> Subscription<E> {
        let id = self.next_id;
        self.next_id += 1;
        self.handlers
            .entry(event)
            .or_default()
            .push(Registration { id, once, handler });
        Subscription { event, id }
    }

    /// Remove one handler
    ///
    /// Returns whether a handler was removed. Removing from an event that
    /// never had handlers only logs a warning.
    pub fn off(&mut self, subscription: Subscription<E>) -> bool {
        let Some(list) = self.handlers.get_mut(&subscription.event) else {
            log::warn!(
                "Trying to remove {:?} handler, but the event does not exist",
                subscription.event
            );
            return false;
        };
        let before = list.len();
        list.retain(|r| r.id != subscription.id);
        before != list.len()
    }

    /// Invoke every handler registered for `event`, in registration order
    ///
    /// `invoke` borrows each handler in turn; the bus itself stays borrowed
    /// for the whole pass, so the set of handlers seen by one pass is fixed.
    /// One-shot handlers are dropped once the pass completes. Returns the
    /// number of handlers invoked.
    pub fn fire(&mut self, event: E, mut invoke: impl FnMut(&mut H)) -> usize {
        let Some(list) = self.handlers.get_mut(&event) else {
            return 0;
        };
        for registration in list.iter_mut() {
            invoke(&mut registration.handler);
        }
        let invoked = list.len();
        list.retain(|r| !r.once);
        invoked
    }

    /// Keep only handlers for which `keep` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(E, bool, &H) -> bool) {
        for (event, list) in self.handlers.iter_mut() {
            list.retain(|r| keep(*event, r.once, &r.handler));
        }
    }

    pub fn handler_count(&self, event: E) -> usize {
        self.handlers.get(&event).map_or(0, Vec::len)
    }

    pub fn is_subscribed(&self, subscription: Subscription<E>) -> bool {
        self.handlers
            .get(&subscription.event)
            .is_some_and(|list| list.iter().any(|r| r.id == subscription.id))
    }
}

// src/events/bus.rs

//! Typed handler registry keyed by [`EventKind`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::events::kind::{CaesiumEvent, EventKind};

pub type EventHandler = Arc<dyn Fn(&CaesiumEvent) + Send + Sync>;

/// Opaque handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: BTreeMap<EventKind, Vec<(SubscriptionId, EventHandler)>>,
}

#[derive(Default, Clone)]
pub struct EventBus {
    inner: Arc<Mutex<Registry>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.lock();
        let counts: BTreeMap<_, _> = registry
            .handlers
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&CaesiumEvent) + Send + Sync + 'static,
    {
        let mut registry = self.inner.lock();
        registry.next_id += 1;
        let id = SubscriptionId(registry.next_id);
        registry
            .handlers
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove a handler. Unknown or already-removed ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.inner.lock();
        let mut removed = false;
        registry.handlers.retain(|_, list| {
            let before = list.len();
            list.retain(|(sid, _)| *sid != id);
            removed |= list.len() != before;
            !list.is_empty()
        });
        removed
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.inner.lock().handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Invoke every handler registered for the event's kind, in registration
    /// order. Returns the number of handlers called.
    ///
    /// The registry lock is released before any handler runs, so handlers may
    /// subscribe or unsubscribe without deadlocking.
    pub fn dispatch(&self, event: &CaesiumEvent) -> usize {
        let Some(kind) = event.kind() else {
            trace!(event_type = %event.event_type, "no kind for event type, not dispatched");
            return 0;
        };

        let handlers: Vec<EventHandler> = {
            let registry = self.inner.lock();
            match registry.handlers.get(&kind) {
                Some(list) => list.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => return 0,
            }
        };

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }
}

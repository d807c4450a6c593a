//! Session event bus.
//!
//! Handlers are registered per [`EventKind`] and run synchronously on the
//! publishing task, in registration order. `publish` dispatches over a
//! snapshot of the handler list, so handlers may subscribe or unsubscribe
//! (themselves included) while an event is being delivered.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use mines_core::{EventKind, SessionEvent};
use parking_lot::RwLock;
use tracing::debug;

/// Callback invoked with each published event of the subscribed kind.
pub type Handler = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// Token returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Typed publish/subscribe channel between the session manager and
/// presentation listeners.
#[derive(Default)]
pub struct EventBus {
    /// Handlers keyed by event kind, in registration order.
    handlers: RwLock<HashMap<EventKind, Vec<(SubscriptionId, Handler)>>>,
    next_id: AtomicU64,
    publish_count: AtomicU64,
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events of `kind`.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .write()
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        debug!(kind = %kind, id = id.0, "subscribed");
        id
    }

    /// Remove a subscription. Returns `false` if it was not registered for
    /// `kind`.
    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write();
        let Some(list) = handlers.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(sub, _)| *sub != id);
        let removed = list.len() < before;
        if removed {
            debug!(kind = %kind, id = id.0, "unsubscribed");
        }
        removed
    }

    /// Deliver `event` to every handler subscribed to its kind.
    ///
    /// Returns the number of handlers invoked.
    pub fn publish(&self, event: SessionEvent) -> usize {
        let _ = self.publish_count.fetch_add(1, Ordering::Relaxed);
        let kind = event.kind();

        // Lock released before dispatch.
        let snapshot: Vec<Handler> = self
            .handlers
            .read()
            .get(&kind)
            .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        for handler in &snapshot {
            handler(&event);
        }
        snapshot.len()
    }

    /// Number of handlers currently subscribed to `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers.read().get(&kind).map_or(0, Vec::len)
    }

    /// Total number of events published.
    pub fn publish_count(&self) -> u64 {
        self.publish_count.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.read();
        f.debug_struct("EventBus")
            .field("subscribers", &handlers.values().map(Vec::len).sum::<usize>())
            .field("publish_count", &self.publish_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mines_core::ErrorData;
    use parking_lot::Mutex;
    use std::sync::OnceLock;

    fn error_event() -> SessionEvent {
        SessionEvent::RequestError(ErrorData::timeout())
    }

    #[test]
    fn publish_with_no_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(error_event()), 0);
        assert_eq!(bus.publish_count(), 1);
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let seen = Arc::clone(&seen);
            let _ = bus.subscribe(EventKind::RequestError, move |_| seen.lock().push(n));
        }

        assert_eq!(bus.publish(error_event()), 3);
        assert_eq!(*seen.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn only_matching_kind_is_delivered() {
        let bus = EventBus::new();
        let hits = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&hits);
        let _ = bus.subscribe(EventKind::CashOutReceived, move |_| *counter.lock() += 1);

        assert_eq!(bus.publish(error_event()), 0);
        assert_eq!(*hits.lock(), 0);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let hits = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&hits);
        let id = bus.subscribe(EventKind::RequestError, move |_| *counter.lock() += 1);
        assert_eq!(bus.subscriber_count(EventKind::RequestError), 1);

        assert!(bus.unsubscribe(EventKind::RequestError, id));
        assert!(!bus.unsubscribe(EventKind::RequestError, id));
        assert_eq!(bus.subscriber_count(EventKind::RequestError), 0);

        let _ = bus.publish(error_event());
        assert_eq!(*hits.lock(), 0);
    }

    #[test]
    fn unsubscribe_wrong_kind_is_noop() {
        let bus = EventBus::new();
        let id = bus.subscribe(EventKind::RequestError, |_| {});
        assert!(!bus.unsubscribe(EventKind::UserInfoUpdated, id));
        assert_eq!(bus.subscriber_count(EventKind::RequestError), 1);
    }

    #[test]
    fn unsubscribe_during_dispatch_completes_snapshot() {
        let bus = Arc::new(EventBus::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let own_id: Arc<OnceLock<SubscriptionId>> = Arc::new(OnceLock::new());

        let first = {
            let bus = Arc::clone(&bus);
            let seen = Arc::clone(&seen);
            let own_id = Arc::clone(&own_id);
            move |_: &SessionEvent| {
                seen.lock().push("first");
                if let Some(id) = own_id.get() {
                    let _ = bus.unsubscribe(EventKind::RequestError, *id);
                }
            }
        };
        let id = bus.subscribe(EventKind::RequestError, first);
        let _ = own_id.set(id);

        let later = Arc::clone(&seen);
        let _ = bus.subscribe(EventKind::RequestError, move |_| later.lock().push("second"));

        assert_eq!(bus.publish(error_event()), 2);
        assert_eq!(*seen.lock(), vec!["first", "second"]);

        assert_eq!(bus.publish(error_event()), 1);
        assert_eq!(*seen.lock(), vec!["first", "second", "second"]);
    }

    #[test]
    fn subscribe_during_dispatch_applies_to_next_publish() {
        let bus = Arc::new(EventBus::new());
        let inner_bus = Arc::clone(&bus);
        let _ = bus.subscribe(EventKind::RequestError, move |_| {
            let _ = inner_bus.subscribe(EventKind::RequestError, |_| {});
        });

        assert_eq!(bus.publish(error_event()), 1);
        assert_eq!(bus.subscriber_count(EventKind::RequestError), 2);
    }
}

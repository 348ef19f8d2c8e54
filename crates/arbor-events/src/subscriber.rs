//! Synchronous subscriber trait and registry.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::event::InvalidationEvent;

/// Trait for subscribers notified inline during `publish`.
///
/// `on_event` runs on the publisher's task and must return quickly. Cache
/// invalidation is the intended use; anything that performs I/O should use
/// an async [`EventReceiver`](crate::EventReceiver) instead.
pub trait InvalidationSubscriber: Send + Sync {
    /// Invoked synchronously for every published event.
    fn on_event(&self, event: &InvalidationEvent);

    /// Return `false` to skip an event. Accepts everything by default.
    fn accepts(&self, event: &InvalidationEvent) -> bool {
        let _ = event;
        true
    }

    /// Name used in logs.
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "anonymous"
    }
}

/// Token returned by [`SubscriberRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Registry of synchronous subscribers.
#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: RwLock<HashMap<SubscriberId, Arc<dyn InvalidationSubscriber>>>,
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscriber_count", &self.len())
            .finish()
    }
}

impl SubscriberRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber and return its handle.
    pub fn register(&self, subscriber: Arc<dyn InvalidationSubscriber>) -> SubscriberId {
        let id = SubscriberId::new();
        let name = subscriber.name().to_string();

        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, subscriber);

        debug!(subscriber = %name, "sync subscriber added");
        id
    }

    /// Unregister a subscriber. Returns `true` if it was registered.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        // Drop the subscriber after releasing the lock: its destructor may publish.
        let removed = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);

        let found = removed.is_some();
        drop(removed);
        if found {
            debug!(id = %id.0, "sync subscriber removed");
        }
        found
    }

    /// Notify every accepting subscriber.
    pub fn notify(&self, event: &InvalidationEvent) {
        // Snapshot so subscribers may (un)register from inside `on_event`.
        let subscribers: Vec<(SubscriberId, Arc<dyn InvalidationSubscriber>)> = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, s)| (*id, Arc::clone(s)))
            .collect();

        for (id, subscriber) in subscribers {
            if !subscriber.accepts(event) {
                continue;
            }
            trace!(
                subscriber_name = %subscriber.name(),
                scope = %event.scope,
                "Notifying subscriber"
            );

            // One panicking subscriber must not starve the others.
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                subscriber.on_event(event);
            }));

            if let Err(e) = result {
                warn!(
                    subscriber_id = ?id,
                    subscriber_name = %subscriber.name(),
                    error = ?e,
                    "Subscriber panicked"
                );
            }
        }
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

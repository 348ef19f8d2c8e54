//! Broadcast bus for invalidation events.

use std::sync::Arc;

use arbor_core::NsPath;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::event::InvalidationEvent;
use crate::subscriber::SubscriberRegistry;

/// Default channel capacity for the bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Process-wide invalidation bus.
///
/// Clones share the same channel and the same subscriber registry.
///
/// Storing a clone of the bus inside a synchronous subscriber creates an
/// `Arc` cycle through the registry and leaks both.
#[derive(Debug)]
pub struct InvalidationBus {
    sender: broadcast::Sender<Arc<InvalidationEvent>>,
    registry: Arc<SubscriberRegistry>,
    capacity: usize,
}

impl InvalidationBus {
    /// Create a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus whose async receivers buffer up to `capacity` events.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            registry: Arc::new(SubscriberRegistry::new()),
            capacity,
        }
    }

    /// Publish an event.
    ///
    /// Synchronous subscribers run first, so by the time any async receiver
    /// wakes up the cache has already dropped the stale listing. Returns the
    /// number of async receivers the event was queued for.
    pub fn publish(&self, event: InvalidationEvent) -> usize {
        let event = Arc::new(event);

        trace!(scope = %event.scope, reason = event.reason.as_str(), "Publishing invalidation");

        self.registry.notify(&event);

        if let Ok(count) = self.sender.send(Arc::clone(&event)) {
            debug!(
                scope = %event.scope,
                reason = event.reason.as_str(),
                receiver_count = count,
                "Invalidation published"
            );
            count
        } else {
            trace!(scope = %event.scope, "No receivers for invalidation");
            0
        }
    }

    /// Receive every event published from now on.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), None)
    }

    /// Receive only events that affect the listing of `path`.
    #[must_use]
    pub fn subscribe_scope(&self, path: NsPath) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), Some(path))
    }

    /// Synchronous subscriber registry.
    #[must_use]
    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    /// Number of async receivers plus synchronous subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender
            .receiver_count()
            .saturating_add(self.registry.len())
    }

    /// Channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InvalidationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InvalidationBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            registry: Arc::clone(&self.registry),
            capacity: self.capacity,
        }
    }
}

/// Async receiver for bus events.
pub struct EventReceiver {
    receiver: broadcast::Receiver<Arc<InvalidationEvent>>,
    /// When set, only events affecting this path are yielded.
    scope: Option<NsPath>,
}

impl EventReceiver {
    pub(crate) fn new(
        receiver: broadcast::Receiver<Arc<InvalidationEvent>>,
        scope: Option<NsPath>,
    ) -> Self {
        Self { receiver, scope }
    }

    fn matches(&self, event: &InvalidationEvent) -> bool {
        self.scope.as_ref().is_none_or(|path| event.affects(path))
    }

    /// Receive the next matching event.
    ///
    /// Returns `None` once every bus handle has been dropped. When the
    /// receiver lags, the dropped events are logged and reception continues
    /// with the oldest retained event.
    pub async fn recv(&mut self) -> Option<Arc<InvalidationEvent>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                },
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "Invalidation receiver lagged, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Receive the next matching event without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<InvalidationEvent>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                },
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(skipped = count, "Invalidation receiver lagged, events dropped");
                },
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::event::{InvalidationReason, Scope};
    use crate::subscriber::InvalidationSubscriber;

    fn p(raw: &str) -> NsPath {
        NsPath::parse(raw).unwrap()
    }

    struct Counter(Arc<AtomicUsize>);

    impl InvalidationSubscriber for Counter {
        fn on_event(&self, _event: &InvalidationEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_bus_creation() {
        let bus = InvalidationBus::new();
        assert_eq!(bus.capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = InvalidationBus::new();
        let count = bus.publish(InvalidationEvent::all(InvalidationReason::Refresh));
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_fan_out_to_all_receivers() {
        let bus = InvalidationBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        let count = bus.publish(InvalidationEvent::path(p("docs"), InvalidationReason::Created));
        assert_eq!(count, 2);

        assert_eq!(first.recv().await.unwrap().scope, Scope::Path(p("docs")));
        assert_eq!(second.recv().await.unwrap().scope, Scope::Path(p("docs")));
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_past_events() {
        let bus = InvalidationBus::new();
        let _early = bus.subscribe();
        bus.publish(InvalidationEvent::all(InvalidationReason::Refresh));

        let mut late = bus.subscribe();
        assert!(late.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_scoped_receiver_filters() {
        let bus = InvalidationBus::new();
        let mut docs = bus.subscribe_scope(p("docs"));

        bus.publish(InvalidationEvent::path(p("docs/sub"), InvalidationReason::Created));
        bus.publish(InvalidationEvent::path(p("music"), InvalidationReason::Deleted));
        assert!(docs.try_recv().is_none());

        bus.publish(InvalidationEvent::path(p("docs"), InvalidationReason::Renamed));
        bus.publish(InvalidationEvent::all(InvalidationReason::Refresh));
        assert_eq!(docs.try_recv().unwrap().reason, InvalidationReason::Renamed);
        assert_eq!(docs.try_recv().unwrap().scope, Scope::All);
    }

    #[tokio::test]
    async fn test_clone_shares_registry() {
        let bus = InvalidationBus::new();
        let cloned = bus.clone();

        let counter = Arc::new(AtomicUsize::new(0));
        cloned
            .registry()
            .register(Arc::new(Counter(Arc::clone(&counter))));

        bus.publish(InvalidationEvent::all(InvalidationReason::Refresh));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_lagged_receiver_keeps_receiving() {
        let bus = InvalidationBus::with_capacity(2);
        let mut receiver = bus.subscribe();

        for _ in 0..5 {
            bus.publish(InvalidationEvent::all(InvalidationReason::Refresh));
        }
        bus.publish(InvalidationEvent::path(p("last"), InvalidationReason::Created));

        let mut last = None;
        while let Some(event) = receiver.try_recv() {
            last = Some(event);
        }
        assert_eq!(last.unwrap().scope, Scope::Path(p("last")));
    }

    #[tokio::test]
    async fn test_recv_returns_none_when_closed() {
        let bus = InvalidationBus::new();
        let mut receiver = bus.subscribe();
        drop(bus);
        assert!(receiver.recv().await.is_none());
    }
}

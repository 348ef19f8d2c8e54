//! Listing of the currently displayed directory.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arbor_core::{Entry, NamespaceClient, NamespaceError, NamespaceResult, NsPath};
use arbor_events::{EventReceiver, InvalidationEvent};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::sort::{ListingSort, sort_entries};

/// What the listing currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingState {
    /// Nothing fetched yet.
    Idle,
    /// A fetch for the current path is in flight.
    Loading,
    /// Entries of the current path, in server order.
    Ready(Arc<[Entry]>),
    /// The latest fetch failed.
    Failed(NamespaceError),
}

/// Point-in-time copy of a [`ListingView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSnapshot {
    /// Directory being shown.
    pub path: NsPath,
    /// Its listing state.
    pub state: ListingState,
}

struct Inner {
    current: NsPath,
    state: ListingState,
    /// Sequence number of the newest request; older responses are dropped.
    seq: u64,
}

/// Binds the navigated path to a flat listing.
pub struct ListingView {
    client: Arc<dyn NamespaceClient>,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for ListingView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("ListingView")
            .field("current", &inner.current)
            .field("state", &inner.state)
            .field("seq", &inner.seq)
            .finish_non_exhaustive()
    }
}

impl ListingView {
    /// Create an idle view positioned at the root.
    #[must_use]
    pub fn new(client: Arc<dyn NamespaceClient>) -> Self {
        Self {
            client,
            inner: Mutex::new(Inner {
                current: NsPath::root(),
                state: ListingState::Idle,
                seq: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Show `path` and fetch its listing.
    ///
    /// # Errors
    ///
    /// Returns the listing error, which also becomes the view state unless
    /// a newer request has been issued meanwhile.
    pub async fn navigate(&self, path: NsPath) -> NamespaceResult<Arc<[Entry]>> {
        self.fetch(Some(path)).await
    }

    /// Fetch the current path again.
    ///
    /// # Errors
    ///
    /// Same as [`ListingView::navigate`].
    pub async fn refresh(&self) -> NamespaceResult<Arc<[Entry]>> {
        self.fetch(None).await
    }

    async fn fetch(&self, target: Option<NsPath>) -> NamespaceResult<Arc<[Entry]>> {
        let (seq, path) = {
            let mut inner = self.lock();
            if let Some(target) = target {
                inner.current = target;
            }
            inner.seq = inner.seq.wrapping_add(1);
            inner.state = ListingState::Loading;
            (inner.seq, inner.current.clone())
        };

        debug!(path = %path, seq, "fetching listing");
        let result = self
            .client
            .list_directory(&path)
            .await
            .map(Arc::<[Entry]>::from);

        let mut inner = self.lock();
        if inner.seq == seq {
            inner.state = match &result {
                Ok(entries) => ListingState::Ready(Arc::clone(entries)),
                Err(err) => {
                    warn!(path = %path, error = %err, "listing fetch failed");
                    ListingState::Failed(err.clone())
                },
            };
        } else {
            debug!(path = %path, seq, latest = inner.seq, "discarding stale listing");
        }
        result
    }

    /// React to an invalidation. Refetches only when the event concerns the
    /// current path; returns whether it did.
    pub async fn apply(&self, event: &InvalidationEvent) -> bool {
        let current = self.current();
        if !event.affects(&current) {
            return false;
        }
        // Failures are already recorded in the view state.
        let _ = self.refresh().await;
        true
    }

    /// Apply every event from `receiver` until the bus closes.
    pub fn watch(self: Arc<Self>, mut receiver: EventReceiver) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                self.apply(&event).await;
            }
            debug!("listing watcher stopped");
        })
    }

    /// Directory being shown.
    #[must_use]
    pub fn current(&self) -> NsPath {
        self.lock().current.clone()
    }

    /// Current path and state.
    #[must_use]
    pub fn snapshot(&self) -> ListingSnapshot {
        let inner = self.lock();
        ListingSnapshot {
            path: inner.current.clone(),
            state: inner.state.clone(),
        }
    }

    /// Entries of a Ready listing, directories first, ordered by `key`.
    #[must_use]
    pub fn sorted(&self, key: ListingSort) -> Option<Vec<Entry>> {
        let inner = self.lock();
        let ListingState::Ready(entries) = &inner.state else {
            return None;
        };
        let mut entries = entries.to_vec();
        sort_entries(&mut entries, key);
        Some(entries)
    }
}

#[cfg(test)]
mod tests {
    use arbor_events::{InvalidationBus, InvalidationReason};
    use arbor_test::{MockNamespace, p, sample_namespace};

    use super::*;

    fn view(mock: &MockNamespace) -> ListingView {
        ListingView::new(Arc::new(mock.clone()))
    }

    #[tokio::test]
    async fn test_navigate_fetches_target_only() {
        let mock = sample_namespace();
        let view = view(&mock);

        let entries = view.navigate(p("a/b/c")).await.unwrap();
        assert!(entries.is_empty());
        assert_eq!(mock.list_order(), vec![p("a/b/c")]);
        assert_eq!(
            view.snapshot(),
            ListingSnapshot {
                path: p("a/b/c"),
                state: ListingState::Ready(entries),
            }
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_is_recorded() {
        let mock = sample_namespace();
        let view = view(&mock);

        assert!(view.navigate(p("missing")).await.is_err());
        assert!(matches!(
            view.snapshot().state,
            ListingState::Failed(NamespaceError::NotFound(_))
        ));
        assert!(view.sorted(ListingSort::Name).is_none());
    }

    #[tokio::test]
    async fn test_apply_refetches_matching_event_only() {
        let mock = sample_namespace();
        let view = view(&mock);
        view.navigate(p("docs")).await.unwrap();

        let unrelated = InvalidationEvent::path(p("a"), InvalidationReason::Created);
        assert!(!view.apply(&unrelated).await);
        assert_eq!(mock.list_calls(&p("docs")), 1);

        mock.create_entry(&p("docs"), "notes.txt", false)
            .await
            .unwrap();
        let related = InvalidationEvent::path(p("docs"), InvalidationReason::Created);
        assert!(view.apply(&related).await);
        assert_eq!(mock.list_calls(&p("docs")), 2);

        let names: Vec<String> = view
            .sorted(ListingSort::Name)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["notes.txt", "report.txt"]);

        assert!(view.apply(&InvalidationEvent::all(InvalidationReason::Refresh)).await);
        assert_eq!(mock.list_calls(&p("docs")), 3);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let mock = sample_namespace();
        let gate = mock.gate(&p("a"));
        let view = Arc::new(view(&mock));

        let slow = tokio::spawn({
            let view = Arc::clone(&view);
            async move { view.navigate(p("a")).await }
        });
        mock.wait_for_list_calls(&p("a"), 1).await;

        let docs = view.navigate(p("docs")).await.unwrap();
        gate.release();
        assert!(slow.await.unwrap().is_ok());

        assert_eq!(
            view.snapshot(),
            ListingSnapshot {
                path: p("docs"),
                state: ListingState::Ready(docs),
            }
        );
    }

    #[tokio::test]
    async fn test_watch_follows_bus() {
        let mock = sample_namespace();
        let bus = InvalidationBus::new();
        let view = Arc::new(view(&mock));
        view.navigate(p("docs")).await.unwrap();
        let handle = Arc::clone(&view).watch(bus.subscribe());

        bus.publish(InvalidationEvent::path(p("a"), InvalidationReason::Deleted));
        bus.publish(InvalidationEvent::path(p("docs"), InvalidationReason::Uploaded));
        mock.wait_for_list_calls(&p("docs"), 2).await;

        drop(bus);
        handle.await.unwrap();
        assert_eq!(mock.list_calls(&p("docs")), 2);
        assert_eq!(mock.list_calls(&p("a")), 0);
    }
}

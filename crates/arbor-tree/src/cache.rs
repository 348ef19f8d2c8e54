//! Path-keyed, partially materialized mirror of the remote directory tree.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arbor_core::{Entry, NamespaceClient, NamespaceResult, NsPath};
use arbor_events::{InvalidationBus, InvalidationEvent, InvalidationSubscriber, Scope, SubscriberId};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{debug, trace, warn};

use crate::node::{LoadState, Node};

type LoadResult = NamespaceResult<Arc<[Entry]>>;
type SharedLoad = Shared<BoxFuture<'static, LoadResult>>;

struct Slot {
    node: Node,
    /// Ticket of the newest load started for this slot, until it lands.
    pending: Option<u64>,
}

impl Slot {
    fn new(node: Node) -> Self {
        Self {
            node,
            pending: None,
        }
    }

    /// Drop the listing and detach any load in flight, so its result is
    /// never stored.
    fn invalidate(&mut self) {
        self.node.clear(LoadState::Unloaded);
        self.pending = None;
    }
}

struct InFlight {
    ticket: u64,
    load: SharedLoad,
}

struct Inner {
    nodes: HashMap<NsPath, Slot>,
    in_flight: HashMap<NsPath, InFlight>,
    next_ticket: u64,
}

impl Inner {
    fn with_root() -> Self {
        let root = NsPath::root();
        let mut nodes = HashMap::new();
        nodes.insert(root.clone(), Slot::new(Node::unloaded(root, true)));
        Self {
            nodes,
            in_flight: HashMap::new(),
            next_ticket: 0,
        }
    }

    /// Drop every descendant of `parent` whose first segment below `parent`
    /// is not one of `names`.
    fn prune_below(&mut self, parent: &NsPath, names: &HashSet<&str>) -> usize {
        let depth = parent.depth();
        let stale = |path: &NsPath| {
            path.starts_with(parent)
                && path
                    .segments()
                    .get(depth)
                    .is_some_and(|first| !names.contains(first.as_str()))
        };
        let before = self.nodes.len();
        self.nodes.retain(|path, _| !stale(path));
        self.in_flight.retain(|path, _| !stale(path));
        before.saturating_sub(self.nodes.len())
    }

    /// True when every proper ancestor of `path` is present and Loaded.
    fn ancestry_loaded(&self, path: &NsPath) -> bool {
        path.ancestors().iter().all(|ancestor| {
            self.nodes
                .get(ancestor)
                .is_some_and(|slot| slot.node.state.is_loaded())
        })
    }

    /// Unload `path` and every Loaded or Loading node below it.
    fn invalidate_subtree(&mut self, path: &NsPath) -> usize {
        let depth = path.depth();
        let below = |p: &NsPath| p.depth() > depth && p.starts_with(path);
        let mut demoted = 0usize;
        for (p, slot) in &mut self.nodes {
            if below(p) && matches!(slot.node.state, LoadState::Loaded | LoadState::Loading) {
                slot.invalidate();
                demoted = demoted.saturating_add(1);
            }
        }
        self.in_flight.retain(|p, _| p != path && !below(p));
        if let Some(slot) = self.nodes.get_mut(path) {
            slot.invalidate();
        }
        demoted
    }

    /// Drop every strict descendant of `path`.
    fn prune_descendants(&mut self, path: &NsPath) {
        let depth = path.depth();
        let below = |p: &NsPath| p.depth() > depth && p.starts_with(path);
        self.nodes.retain(|p, _| !below(p));
        self.in_flight.retain(|p, _| !below(p));
    }

    fn store_listing(&mut self, path: &NsPath, entries: &Arc<[Entry]>) {
        let children: Vec<NsPath> = entries.iter().map(|e| path.join(&e.name)).collect();

        if let Some(slot) = self.nodes.get_mut(path) {
            slot.node.is_dir = true;
            slot.node.children = Some(children.clone());
            slot.node.entries = Some(Arc::clone(entries));
            slot.node.state = LoadState::Loaded;
            slot.node.loaded_once = true;
        }

        let names: HashSet<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        let pruned = self.prune_below(path, &names);
        if pruned > 0 {
            debug!(path = %path, pruned, "dropped nodes missing from fresh listing");
        }

        for (entry, child) in entries.iter().zip(children) {
            match self.nodes.get(&child).map(|slot| slot.node.is_dir) {
                Some(is_dir) if is_dir == entry.is_dir => {},
                Some(_) => {
                    // Same name, different kind: nothing cached below it is valid.
                    self.prune_descendants(&child);
                    self.in_flight.remove(&child);
                    self.nodes
                        .insert(child.clone(), Slot::new(Node::unloaded(child, entry.is_dir)));
                },
                None => {
                    self.nodes
                        .insert(child.clone(), Slot::new(Node::unloaded(child, entry.is_dir)));
                },
            }
        }
    }
}

enum Begin {
    Hit(Arc<[Entry]>),
    Load { ticket: u64, load: SharedLoad },
}

/// In-memory mirror of the remote namespace, rooted at the empty path.
///
/// Nodes are loaded on demand through [`TreeCache::ensure_loaded`]. There is
/// at most one listing request in flight per path; loads for different paths
/// run in parallel. The node map is the only shared mutable state and is
/// never locked across an `.await`.
pub struct TreeCache {
    client: Arc<dyn NamespaceClient>,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for TreeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("TreeCache")
            .field("nodes", &inner.nodes.len())
            .field("in_flight", &inner.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl TreeCache {
    /// Create a cache holding only an unloaded root.
    #[must_use]
    pub fn new(client: Arc<dyn NamespaceClient>) -> Arc<Self> {
        Arc::new(Self {
            client,
            inner: Mutex::new(Inner::with_root()),
        })
    }

    /// Register this cache as a synchronous subscriber of `bus`.
    ///
    /// Invalidation then happens inside `publish`, before any async receiver
    /// is woken.
    pub fn attach(self: &Arc<Self>, bus: &InvalidationBus) -> SubscriberId {
        bus.registry()
            .register(Arc::clone(self) as Arc<dyn InvalidationSubscriber>)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the children of `path`, listing it only if necessary.
    ///
    /// Proper ancestors are ensured first, root down, so a Loaded node always
    /// sits under Loaded ancestors. A Loaded node answers from memory. An
    /// Unloaded or Error node issues exactly one `list_directory`. A node
    /// that is already Loading is joined: every concurrent caller observes
    /// the same result.
    ///
    /// # Errors
    ///
    /// Returns the first listing error on the way down, which is also stored
    /// on its node.
    pub async fn ensure_loaded(&self, path: &NsPath) -> NamespaceResult<Arc<[Entry]>> {
        for ancestor in path.ancestors() {
            self.load_one(&ancestor).await?;
        }
        self.load_one(path).await
    }

    async fn load_one(&self, path: &NsPath) -> NamespaceResult<Arc<[Entry]>> {
        let (ticket, load) = match self.begin(path) {
            Begin::Hit(entries) => return Ok(entries),
            Begin::Load { ticket, load } => (ticket, load),
        };

        let result = load.await;
        self.finish(path, ticket, &result);
        result
    }

    fn begin(&self, path: &NsPath) -> Begin {
        let mut guard = self.lock();
        let inner = &mut *guard;

        if let Some(slot) = inner.nodes.get(path) {
            if let (LoadState::Loaded, Some(entries)) = (&slot.node.state, &slot.node.entries) {
                debug!(path = %path, "tree cache hit");
                return Begin::Hit(Arc::clone(entries));
            }
        }

        if let Some(flight) = inner.in_flight.get(path) {
            debug!(path = %path, ticket = flight.ticket, "joining in-flight listing");
            return Begin::Load {
                ticket: flight.ticket,
                load: flight.load.clone(),
            };
        }

        let ticket = inner.next_ticket;
        inner.next_ticket = ticket.wrapping_add(1);

        let slot = inner
            .nodes
            .entry(path.clone())
            .or_insert_with(|| Slot::new(Node::unloaded(path.clone(), true)));
        slot.node.state = LoadState::Loading;
        slot.pending = Some(ticket);

        let client = Arc::clone(&self.client);
        let target = path.clone();
        let load = async move {
            client
                .list_directory(&target)
                .await
                .map(Arc::<[Entry]>::from)
        }
        .boxed()
        .shared();

        inner.in_flight.insert(
            path.clone(),
            InFlight {
                ticket,
                load: load.clone(),
            },
        );

        debug!(path = %path, ticket, "listing directory");
        Begin::Load { ticket, load }
    }

    fn finish(&self, path: &NsPath, ticket: u64, result: &LoadResult) {
        let mut guard = self.lock();
        let inner = &mut *guard;

        if inner
            .in_flight
            .get(path)
            .is_some_and(|flight| flight.ticket == ticket)
        {
            inner.in_flight.remove(path);
        }

        let ancestry_loaded = inner.ancestry_loaded(path);

        // Joined callers all land here; only the first one writes.
        let Some(slot) = inner.nodes.get_mut(path) else {
            return;
        };
        if slot.pending != Some(ticket) {
            trace!(path = %path, ticket, "listing result detached, applied or superseded");
            return;
        }
        slot.pending = None;

        if result.is_ok() && !ancestry_loaded {
            debug!(path = %path, ticket, "ancestor unloaded during listing; result not cached");
            slot.node.clear(LoadState::Unloaded);
            return;
        }

        match result {
            Ok(entries) => {
                inner.store_listing(path, entries);
                debug!(path = %path, children = entries.len(), "listing stored");
            },
            Err(err) => {
                warn!(path = %path, error = %err, "listing failed");
                slot.node.clear(LoadState::Error(err.clone()));
            },
        }
    }

    /// Mark a scope stale.
    ///
    /// `Scope::Path` resets that node to Unloaded and drops its children.
    /// Loaded nodes below it are demoted to Unloaded as well and reload
    /// lazily when next reached; ancestors and siblings keep their state.
    /// `Scope::All` resets every node.
    ///
    /// An in-flight load for an invalidated node is detached: its callers
    /// still get its result, but it is never stored, and the next
    /// `ensure_loaded` issues a fresh request.
    pub fn invalidate(&self, scope: &Scope) {
        let mut guard = self.lock();
        let inner = &mut *guard;

        match scope {
            Scope::All => {
                for slot in inner.nodes.values_mut() {
                    slot.invalidate();
                }
                inner.in_flight.clear();
                debug!(nodes = inner.nodes.len(), "invalidated entire tree");
            },
            Scope::Path(path) => {
                let known = inner.nodes.contains_key(path);
                let demoted = inner.invalidate_subtree(path);
                if known {
                    debug!(path = %path, demoted, "invalidated listing");
                }
            },
        }
    }

    /// Snapshot of one node. Never performs I/O.
    #[must_use]
    pub fn get_node(&self, path: &NsPath) -> Option<Node> {
        self.lock().nodes.get(path).map(|slot| slot.node.clone())
    }

    /// Load state of one node, if it exists.
    #[must_use]
    pub fn state(&self, path: &NsPath) -> Option<LoadState> {
        self.lock().nodes.get(path).map(|slot| slot.node.state.clone())
    }

    /// Cached entries of a Loaded node. Never performs I/O.
    #[must_use]
    pub fn children(&self, path: &NsPath) -> Option<Arc<[Entry]>> {
        let inner = self.lock();
        let node = &inner.nodes.get(path)?.node;
        if node.state.is_loaded() {
            node.entries.clone()
        } else {
            None
        }
    }

    /// Paths of all Loaded nodes, parents before children.
    #[must_use]
    pub fn loaded_paths(&self) -> Vec<NsPath> {
        let mut paths: Vec<NsPath> = self
            .lock()
            .nodes
            .iter()
            .filter(|(_, slot)| slot.node.state.is_loaded())
            .map(|(path, _)| path.clone())
            .collect();
        paths.sort();
        paths
    }

    /// Loaded nodes that have an ancestor which is missing or not Loaded.
    /// Always empty; exposed for tests.
    #[must_use]
    pub fn orphaned_loaded(&self) -> Vec<NsPath> {
        let inner = self.lock();
        let mut orphans: Vec<NsPath> = inner
            .nodes
            .iter()
            .filter(|(_, slot)| slot.node.state.is_loaded())
            .filter(|(path, _)| {
                path.ancestors().iter().any(|ancestor| {
                    !inner
                        .nodes
                        .get(ancestor)
                        .is_some_and(|slot| slot.node.state.is_loaded())
                })
            })
            .map(|(path, _)| path.clone())
            .collect();
        orphans.sort();
        orphans
    }

    /// Number of known nodes, including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().nodes.len()
    }

    /// Always false: the root node cannot be removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().nodes.is_empty()
    }

    /// Forget everything except an unloaded root.
    pub fn reset(&self) {
        *self.lock() = Inner::with_root();
        debug!("tree cache reset");
    }
}

impl InvalidationSubscriber for TreeCache {
    fn on_event(&self, event: &InvalidationEvent) {
        self.invalidate(&event.scope);
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "tree-cache"
    }
}

//! Ancestor walks toward a navigation target.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arbor_core::{NamespaceError, NamespaceResult, NsPath};
use arbor_events::EventReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::TreeCache;

/// Which directories are shown expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: BTreeSet<NsPath>,
    loaded_once: BTreeSet<NsPath>,
    target: Option<NsPath>,
}

impl ExpansionState {
    /// True if `path` is currently expanded.
    #[must_use]
    pub fn is_expanded(&self, path: &NsPath) -> bool {
        self.expanded.contains(path)
    }

    /// Expanded paths, parents before children.
    #[must_use]
    pub fn expanded(&self) -> &BTreeSet<NsPath> {
        &self.expanded
    }

    /// Directories whose children have been fetched at least once.
    #[must_use]
    pub fn loaded_once(&self) -> &BTreeSet<NsPath> {
        &self.loaded_once
    }

    /// Target of the most recent navigation.
    #[must_use]
    pub fn target(&self) -> Option<&NsPath> {
        self.target.as_ref()
    }
}

/// How a navigation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkOutcome {
    /// Every ancestor was loaded and the expansion set replaced.
    Completed {
        /// The navigation target.
        target: NsPath,
        /// Whether the target is itself a directory (and so expanded).
        is_dir: bool,
    },
    /// A newer navigation started before this one finished. Loads already
    /// completed stay cached; the expansion set was not touched.
    Superseded {
        /// The abandoned target.
        target: NsPath,
    },
}

/// Result of [`ExpansionController::refresh_expanded`].
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Expanded directories that were listed again.
    pub reloaded: Vec<NsPath>,
    /// Expanded directories whose listing failed.
    pub failed: Vec<(NsPath, NamespaceError)>,
}

struct Inner {
    state: ExpansionState,
    generation: u64,
}

/// Drives the expansion set from navigation targets.
pub struct ExpansionController {
    cache: Arc<TreeCache>,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for ExpansionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("ExpansionController")
            .field("state", &inner.state)
            .field("generation", &inner.generation)
            .finish_non_exhaustive()
    }
}

/// Directories loaded on the way to `target`, root first.
fn walk_for(target: &NsPath) -> Vec<NsPath> {
    if target.is_root() {
        vec![NsPath::root()]
    } else {
        target.ancestors()
    }
}

impl ExpansionController {
    /// Create a controller with nothing expanded.
    #[must_use]
    pub fn new(cache: Arc<TreeCache>) -> Self {
        Self {
            cache,
            inner: Mutex::new(Inner {
                state: ExpansionState::default(),
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The cache this controller walks.
    #[must_use]
    pub fn cache(&self) -> &Arc<TreeCache> {
        &self.cache
    }

    /// Snapshot of the expansion state.
    #[must_use]
    pub fn expansion(&self) -> ExpansionState {
        self.lock().state.clone()
    }

    /// Target of the most recent navigation.
    #[must_use]
    pub fn current_target(&self) -> Option<NsPath> {
        self.lock().state.target.clone()
    }

    /// Navigate to `target`.
    ///
    /// Loads every proper ancestor of `target` in order from the root, one
    /// at a time, each through [`TreeCache::ensure_loaded`] so that cached
    /// levels cost nothing. For the root itself, the root is loaded. On
    /// success the expansion set becomes exactly the walked directories plus
    /// `target` when it is a directory.
    ///
    /// Starting another navigation abandons this one at its next step.
    ///
    /// # Errors
    ///
    /// The first failing listing stops the walk and is returned unchanged.
    /// Returns [`NamespaceError::NotFound`] if the parent listing does not
    /// contain `target`. The expansion set is left untouched in both cases.
    pub async fn navigate(&self, target: &NsPath) -> NamespaceResult<WalkOutcome> {
        let generation = {
            let mut inner = self.lock();
            inner.generation = inner.generation.wrapping_add(1);
            inner.state.target = Some(target.clone());
            inner.generation
        };

        let walk = walk_for(target);
        let mut parent_entries = None;

        for step in &walk {
            if self.lock().generation != generation {
                debug!(target = %target, at = %step, "navigation superseded");
                return Ok(WalkOutcome::Superseded {
                    target: target.clone(),
                });
            }

            match self.cache.ensure_loaded(step).await {
                Ok(entries) => {
                    self.lock().state.loaded_once.insert(step.clone());
                    parent_entries = Some(entries);
                },
                Err(err) => {
                    warn!(target = %target, at = %step, error = %err, "ancestor walk stopped");
                    return Err(err);
                },
            }
        }

        let is_dir = match target.name() {
            None => true,
            Some(name) => parent_entries
                .as_deref()
                .and_then(|entries| entries.iter().find(|e| e.name == name))
                .map(|entry| entry.is_dir)
                .ok_or_else(|| NamespaceError::NotFound(target.to_string()))?,
        };

        let mut expanded: BTreeSet<NsPath> = walk.into_iter().collect();
        if is_dir {
            expanded.insert(target.clone());
        }

        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(target = %target, "navigation superseded after walk");
            return Ok(WalkOutcome::Superseded {
                target: target.clone(),
            });
        }
        inner.state.expanded = expanded;
        drop(inner);

        info!(target = %target, is_dir, "navigation complete");
        Ok(WalkOutcome::Completed {
            target: target.clone(),
            is_dir,
        })
    }

    /// Expand or collapse one directory. Returns the new expanded flag.
    ///
    /// Expanding loads the directory first; collapsing never does I/O.
    ///
    /// # Errors
    ///
    /// Returns the listing error when expanding; the path stays collapsed.
    pub async fn toggle(&self, path: &NsPath) -> NamespaceResult<bool> {
        if self.lock().state.expanded.remove(path) {
            debug!(path = %path, "collapsed");
            return Ok(false);
        }

        self.cache.ensure_loaded(path).await?;

        let mut inner = self.lock();
        inner.state.loaded_once.insert(path.clone());
        inner.state.expanded.insert(path.clone());
        debug!(path = %path, "expanded");
        Ok(true)
    }

    /// Reload every expanded directory that is no longer Loaded.
    ///
    /// Directories are visited parents first. Descendants of a failed
    /// directory are skipped. Directories that no longer exist are collapsed;
    /// one already missing from its freshly Loaded parent is collapsed without
    /// a request.
    pub async fn refresh_expanded(&self) -> RefreshReport {
        let expanded: Vec<NsPath> = self.lock().state.expanded.iter().cloned().collect();
        let mut report = RefreshReport::default();

        for path in expanded {
            if report
                .failed
                .iter()
                .any(|(failed, _)| path.starts_with(failed))
            {
                continue;
            }
            if self.cache.state(&path).is_some_and(|s| s.is_loaded()) {
                continue;
            }
            if self.pruned(&path) {
                debug!(path = %path, "expanded directory gone from parent listing");
                self.lock().state.expanded.remove(&path);
                report
                    .failed
                    .push((path.clone(), NamespaceError::NotFound(path.to_string())));
                continue;
            }

            match self.cache.ensure_loaded(&path).await {
                Ok(_) => report.reloaded.push(path),
                Err(err) => {
                    if matches!(err, NamespaceError::NotFound(_)) {
                        self.lock().state.expanded.remove(&path);
                    }
                    warn!(path = %path, error = %err, "refresh of expanded directory failed");
                    report.failed.push((path, err));
                },
            }
        }

        debug!(
            reloaded = report.reloaded.len(),
            failed = report.failed.len(),
            "refreshed expanded directories"
        );
        report
    }

    /// True when `path` has no node but its parent is Loaded, i.e. the
    /// parent's current listing does not contain it.
    fn pruned(&self, path: &NsPath) -> bool {
        self.cache.get_node(path).is_none()
            && path
                .parent()
                .and_then(|parent| self.cache.state(&parent))
                .is_some_and(|state| state.is_loaded())
    }

    /// Refresh expanded directories whenever an event touches one of them.
    ///
    /// The task ends when the bus is dropped.
    pub fn watch(self: Arc<Self>, mut receiver: EventReceiver) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                let affected = self
                    .lock()
                    .state
                    .expanded
                    .iter()
                    .any(|path| event.affects(path));
                if affected {
                    self.refresh_expanded().await;
                }
            }
            debug!("expansion watcher stopped");
        })
    }
}

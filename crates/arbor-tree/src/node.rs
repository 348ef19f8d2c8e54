use std::sync::Arc;

use arbor_core::{Entry, NamespaceError, NsPath};

/// Load status of a node's children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Never fetched, or invalidated since the last fetch.
    Unloaded,
    /// A listing request is in flight.
    Loading,
    /// Children reflect one completed listing.
    Loaded,
    /// The last listing failed; the next `ensure_loaded` retries.
    Error(NamespaceError),
}

impl LoadState {
    /// True for [`LoadState::Loaded`].
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded)
    }
}

/// The cache's local representation of one namespace entry.
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique key within the cache.
    pub path: NsPath,
    /// True for directories. Only directories are ever listed.
    pub is_dir: bool,
    /// Child identities in listing order. `None` means unloaded, which is
    /// distinct from `Some` of an empty vector.
    pub children: Option<Vec<NsPath>>,
    /// Entries of the listing that produced `children`.
    pub entries: Option<Arc<[Entry]>>,
    /// Current load status.
    pub state: LoadState,
    /// True once any listing of this node has completed successfully.
    pub loaded_once: bool,
}

impl Node {
    pub(crate) fn unloaded(path: NsPath, is_dir: bool) -> Self {
        Self {
            path,
            is_dir,
            children: None,
            entries: None,
            state: LoadState::Unloaded,
            loaded_once: false,
        }
    }

    pub(crate) fn clear(&mut self, state: LoadState) {
        self.children = None;
        self.entries = None;
        self.state = state;
    }
}

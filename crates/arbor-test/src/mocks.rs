//! In-memory namespace for testing.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use arbor_core::{
    Entry, NamespaceClient, NamespaceError, NamespaceResult, NsPath, Transfer, validate_name,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::fixtures::p;

/// One stored item of the mock namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockNode {
    /// A directory.
    Dir,
    /// A file with its content.
    File {
        /// File bytes.
        data: Vec<u8>,
        /// Reported modification time.
        modified: Option<DateTime<Utc>>,
    },
}

impl MockNode {
    fn is_dir(&self) -> bool {
        matches!(self, Self::Dir)
    }
}

/// A recorded call against [`MockNamespace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// `list_directory(path)`.
    List(NsPath),
    /// `create_entry(parent, name, is_dir)`.
    Create {
        /// Parent directory.
        parent: NsPath,
        /// New entry name.
        name: String,
        /// Directory flag.
        is_dir: bool,
    },
    /// `rename_entry(from, to)`.
    Rename {
        /// Source path.
        from: NsPath,
        /// Destination path.
        to: NsPath,
    },
    /// `delete_entry(path)`.
    Delete(NsPath),
    /// `upload(parent, name, content)`.
    Upload {
        /// Parent directory.
        parent: NsPath,
        /// File name.
        name: String,
        /// Uploaded byte count.
        size: usize,
    },
    /// `download(path)`.
    Download(NsPath),
}

/// Holds `list_directory` calls for one path until released.
#[derive(Debug, Clone)]
pub struct Gate {
    open: Arc<watch::Sender<bool>>,
}

impl Gate {
    /// Let every waiting and future listing of the gated path proceed.
    pub fn release(&self) {
        self.open.send_replace(true);
    }
}

#[derive(Debug, Default)]
struct State {
    nodes: BTreeMap<NsPath, MockNode>,
    calls: Vec<MockCall>,
    list_failures: HashMap<NsPath, VecDeque<NamespaceError>>,
    mutation_failures: VecDeque<NamespaceError>,
    gates: HashMap<NsPath, watch::Receiver<bool>>,
}

impl State {
    fn kind(&self, path: &NsPath) -> Option<bool> {
        if path.is_root() {
            return Some(true);
        }
        self.nodes.get(path).map(MockNode::is_dir)
    }

    fn require_dir(&self, path: &NsPath) -> NamespaceResult<()> {
        match self.kind(path) {
            Some(true) => Ok(()),
            Some(false) => Err(NamespaceError::InvalidName(format!(
                "{path} is not a directory"
            ))),
            None => Err(NamespaceError::NotFound(path.to_string())),
        }
    }

    fn insert_dirs(&mut self, path: &NsPath) {
        for ancestor in path.ancestors().into_iter().skip(1) {
            self.nodes.entry(ancestor).or_insert(MockNode::Dir);
        }
        if !path.is_root() {
            self.nodes.entry(path.clone()).or_insert(MockNode::Dir);
        }
    }

    fn listing(&self, path: &NsPath) -> NamespaceResult<Vec<Entry>> {
        self.require_dir(path)?;
        Ok(self
            .nodes
            .iter()
            .filter(|(child, _)| child.parent().as_ref() == Some(path))
            .filter_map(|(child, node)| {
                let name = child.name()?;
                Some(match node {
                    MockNode::Dir => Entry::dir(name),
                    MockNode::File { data, modified } => {
                        let size = u64::try_from(data.len()).unwrap_or(u64::MAX);
                        let entry = Entry::file(name, size);
                        match modified {
                            Some(at) => entry.with_modified(*at),
                            None => entry,
                        }
                    },
                })
            })
            .collect())
    }

    fn take_mutation_failure(&mut self) -> NamespaceResult<()> {
        self.mutation_failures.pop_front().map_or(Ok(()), Err)
    }
}

/// In-memory implementation of [`NamespaceClient`] and [`Transfer`].
///
/// Clones share state, so a test can keep one handle for assertions while
/// the code under test owns another. Every call is recorded before it is
/// gated or failed.
#[derive(Debug, Clone, Default)]
pub struct MockNamespace {
    state: Arc<Mutex<State>>,
}

impl MockNamespace {
    /// Create an empty namespace (root only).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a directory and any missing ancestors.
    #[must_use]
    pub fn with_dir(self, path: &str) -> Self {
        self.lock().insert_dirs(&p(path));
        self
    }

    /// Add a file and any missing parent directories.
    #[must_use]
    pub fn with_file(self, path: &str, data: &[u8]) -> Self {
        self.insert_file(&p(path), data, None);
        self
    }

    /// Add a file with a modification time.
    #[must_use]
    pub fn with_file_at(self, path: &str, data: &[u8], modified: DateTime<Utc>) -> Self {
        self.insert_file(&p(path), data, Some(modified));
        self
    }

    fn insert_file(&self, path: &NsPath, data: &[u8], modified: Option<DateTime<Utc>>) {
        let mut state = self.lock();
        if let Some(parent) = path.parent() {
            state.insert_dirs(&parent);
        }
        state.nodes.insert(
            path.clone(),
            MockNode::File {
                data: data.to_vec(),
                modified,
            },
        );
    }

    /// Make the next listing of `path` fail with `error`.
    pub fn fail_next_list(&self, path: &NsPath, error: NamespaceError) {
        self.lock()
            .list_failures
            .entry(path.clone())
            .or_default()
            .push_back(error);
    }

    /// Make the next mutation (create, rename, delete or upload) fail.
    pub fn fail_next_mutation(&self, error: NamespaceError) {
        self.lock().mutation_failures.push_back(error);
    }

    /// Hold listings of `path` until [`Gate::release`] is called.
    #[must_use]
    pub fn gate(&self, path: &NsPath) -> Gate {
        let (tx, rx) = watch::channel(false);
        self.lock().gates.insert(path.clone(), rx);
        Gate { open: Arc::new(tx) }
    }

    /// Every recorded call, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Paths listed so far, in call order.
    #[must_use]
    pub fn list_order(&self) -> Vec<NsPath> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                MockCall::List(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of listings of `path` so far.
    #[must_use]
    pub fn list_calls(&self, path: &NsPath) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, MockCall::List(listed) if listed == path))
            .count()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// True if `path` currently exists.
    #[must_use]
    pub fn exists(&self, path: &NsPath) -> bool {
        self.lock().kind(path).is_some()
    }

    /// Wait until `path` has been listed at least `count` times.
    ///
    /// # Panics
    ///
    /// Panics after five seconds.
    pub async fn wait_for_list_calls(&self, path: &NsPath, count: usize) {
        let wait = async {
            while self.list_calls(path) < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        };
        assert!(
            tokio::time::timeout(Duration::from_secs(5), wait)
                .await
                .is_ok(),
            "timed out waiting for {count} listings of {path}"
        );
    }

    fn record(&self, call: MockCall) {
        self.lock().calls.push(call);
    }
}

#[async_trait]
impl NamespaceClient for MockNamespace {
    /// The listing is taken when the call is made; a gate only delays the
    /// answer.
    async fn list_directory(&self, path: &NsPath) -> NamespaceResult<Vec<Entry>> {
        let (gate, result) = {
            let mut state = self.lock();
            state.calls.push(MockCall::List(path.clone()));
            let gate = state.gates.get(path).cloned();
            let result = match state
                .list_failures
                .get_mut(path)
                .and_then(VecDeque::pop_front)
            {
                Some(error) => Err(error),
                None => state.listing(path),
            };
            (gate, result)
        };

        if let Some(mut gate) = gate {
            // A dropped gate counts as released.
            let _ = gate.wait_for(|open| *open).await;
        }
        result
    }

    async fn create_entry(&self, parent: &NsPath, name: &str, is_dir: bool) -> NamespaceResult<()> {
        self.record(MockCall::Create {
            parent: parent.clone(),
            name: name.to_owned(),
            is_dir,
        });
        let mut state = self.lock();
        state.take_mutation_failure()?;
        validate_name(name)?;
        state.require_dir(parent)?;

        let path = parent.join(name);
        if state.nodes.contains_key(&path) {
            return Err(NamespaceError::AlreadyExists(path.to_string()));
        }
        let node = if is_dir {
            MockNode::Dir
        } else {
            MockNode::File {
                data: Vec::new(),
                modified: None,
            }
        };
        state.nodes.insert(path, node);
        Ok(())
    }

    async fn rename_entry(&self, old: &NsPath, new: &NsPath) -> NamespaceResult<()> {
        self.record(MockCall::Rename {
            from: old.clone(),
            to: new.clone(),
        });
        let mut state = self.lock();
        state.take_mutation_failure()?;

        if old.is_root() || new.is_root() || new.starts_with(old) {
            return Err(NamespaceError::InvalidName(format!(
                "cannot move {old} to {new}"
            )));
        }
        if !state.nodes.contains_key(old) {
            return Err(NamespaceError::NotFound(old.to_string()));
        }
        if state.nodes.contains_key(new) {
            return Err(NamespaceError::AlreadyExists(new.to_string()));
        }
        if let Some(parent) = new.parent() {
            state.require_dir(&parent)?;
        }

        let moved: Vec<NsPath> = state
            .nodes
            .keys()
            .filter(|path| path.starts_with(old))
            .cloned()
            .collect();
        for path in moved {
            if let Some(node) = state.nodes.remove(&path) {
                let target = path
                    .segments()
                    .iter()
                    .skip(old.depth())
                    .fold(new.clone(), |acc, segment| acc.join(segment));
                state.nodes.insert(target, node);
            }
        }
        Ok(())
    }

    async fn delete_entry(&self, path: &NsPath) -> NamespaceResult<()> {
        self.record(MockCall::Delete(path.clone()));
        let mut state = self.lock();
        state.take_mutation_failure()?;

        if path.is_root() {
            return Err(NamespaceError::InvalidName("cannot delete the root".into()));
        }
        if !state.nodes.contains_key(path) {
            return Err(NamespaceError::NotFound(path.to_string()));
        }
        state.nodes.retain(|existing, _| !existing.starts_with(path));
        Ok(())
    }
}

#[async_trait]
impl Transfer for MockNamespace {
    async fn upload(&self, parent: &NsPath, name: &str, content: Vec<u8>) -> NamespaceResult<()> {
        self.record(MockCall::Upload {
            parent: parent.clone(),
            name: name.to_owned(),
            size: content.len(),
        });
        let mut state = self.lock();
        state.take_mutation_failure()?;
        validate_name(name)?;
        state.require_dir(parent)?;

        let path = parent.join(name);
        if state.kind(&path) == Some(true) {
            return Err(NamespaceError::Conflict(format!("{path} is a directory")));
        }
        state.nodes.insert(
            path,
            MockNode::File {
                data: content,
                modified: Some(Utc::now()),
            },
        );
        Ok(())
    }

    async fn download(&self, path: &NsPath) -> NamespaceResult<Vec<u8>> {
        self.record(MockCall::Download(path.clone()));
        match self.lock().nodes.get(path) {
            Some(MockNode::File { data, .. }) => Ok(data.clone()),
            Some(MockNode::Dir) => Err(NamespaceError::InvalidName(format!(
                "{path} is a directory"
            ))),
            None => Err(NamespaceError::NotFound(path.to_string())),
        }
    }
}

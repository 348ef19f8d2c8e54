//! Mutation gateway: run a mutation, then publish what it invalidated.

use std::sync::Arc;

use arbor_core::{NamespaceClient, NamespaceError, NamespaceResult, NsPath, Transfer};
use arbor_events::{InvalidationBus, InvalidationEvent, InvalidationReason};
use tracing::{info, warn};

const EVENT_SOURCE: &str = "mutator";

/// Runs namespace mutations and publishes invalidations.
///
/// Events are published only after the client reports success, scoped to
/// the parent directory whose listing changed. A failed mutation publishes
/// nothing and is never retried.
pub struct Mutator {
    client: Arc<dyn NamespaceClient>,
    transfer: Option<Arc<dyn Transfer>>,
    bus: InvalidationBus,
}

impl std::fmt::Debug for Mutator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mutator")
            .field("uploads", &self.transfer.is_some())
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

impl Mutator {
    /// Create a gateway without upload support.
    #[must_use]
    pub fn new(client: Arc<dyn NamespaceClient>, bus: InvalidationBus) -> Self {
        Self {
            client,
            transfer: None,
            bus,
        }
    }

    /// Enable [`Mutator::upload`].
    #[must_use]
    pub fn with_transfer(mut self, transfer: Arc<dyn Transfer>) -> Self {
        self.transfer = Some(transfer);
        self
    }

    /// The bus events are published on.
    #[must_use]
    pub fn bus(&self) -> &InvalidationBus {
        &self.bus
    }

    fn publish(&self, scope: &NsPath, reason: InvalidationReason) {
        self.bus.publish(
            InvalidationEvent::path(scope.clone(), reason).with_source(EVENT_SOURCE),
        );
    }

    /// Create `parent/name`. Returns the new path.
    ///
    /// # Errors
    ///
    /// Returns the client error; nothing is published.
    pub async fn create(&self, parent: &NsPath, name: &str, is_dir: bool) -> NamespaceResult<NsPath> {
        self.client
            .create_entry(parent, name, is_dir)
            .await
            .inspect_err(|err| warn!(parent = %parent, name, error = %err, "create failed"))?;

        let path = parent.join(name);
        info!(path = %path, is_dir, "entry created");
        self.publish(parent, InvalidationReason::Created);
        Ok(path)
    }

    /// Move `old` to `new`.
    ///
    /// Publishes the old parent, and the new parent when it differs.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceError::InvalidName`] for the root, otherwise the
    /// client error; nothing is published on failure.
    pub async fn rename(&self, old: &NsPath, new: &NsPath) -> NamespaceResult<()> {
        let (Some(old_parent), Some(new_parent)) = (old.parent(), new.parent()) else {
            return Err(NamespaceError::InvalidName("cannot rename the root".into()));
        };

        self.client
            .rename_entry(old, new)
            .await
            .inspect_err(|err| warn!(from = %old, to = %new, error = %err, "rename failed"))?;

        info!(from = %old, to = %new, "entry renamed");
        self.publish(&old_parent, InvalidationReason::Renamed);
        if new_parent != old_parent {
            self.publish(&new_parent, InvalidationReason::Renamed);
        }
        Ok(())
    }

    /// Delete `path` and everything below it.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceError::InvalidName`] for the root, otherwise the
    /// client error; nothing is published on failure.
    pub async fn delete(&self, path: &NsPath) -> NamespaceResult<()> {
        let Some(parent) = path.parent() else {
            return Err(NamespaceError::InvalidName("cannot delete the root".into()));
        };

        self.client
            .delete_entry(path)
            .await
            .inspect_err(|err| warn!(path = %path, error = %err, "delete failed"))?;

        info!(path = %path, "entry deleted");
        self.publish(&parent, InvalidationReason::Deleted);
        Ok(())
    }

    /// Upload `content` as `parent/name`. Returns the file path.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceError::PermissionDenied`] when no transfer is
    /// configured, otherwise the transfer error; nothing is published on
    /// failure.
    pub async fn upload(&self, parent: &NsPath, name: &str, content: Vec<u8>) -> NamespaceResult<NsPath> {
        let Some(transfer) = &self.transfer else {
            return Err(NamespaceError::PermissionDenied(
                "uploads are not supported by this client".into(),
            ));
        };
        let size = content.len();

        transfer
            .upload(parent, name, content)
            .await
            .inspect_err(|err| warn!(parent = %parent, name, error = %err, "upload failed"))?;

        let path = parent.join(name);
        info!(path = %path, bytes = size, "file uploaded");
        self.publish(parent, InvalidationReason::Uploaded);
        Ok(path)
    }

    /// Mark everything stale.
    pub fn refresh_all(&self) {
        info!("full refresh requested");
        self.bus.publish(
            InvalidationEvent::all(InvalidationReason::Refresh).with_source(EVENT_SOURCE),
        );
    }
}

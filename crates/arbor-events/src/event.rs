//! Invalidation event types.

use std::fmt;

use arbor_core::NsPath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata attached to every event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
    /// Component that published the event.
    pub source: String,
}

impl EventMetadata {
    /// Create new event metadata.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
        }
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self::new("unknown")
    }
}

/// What an invalidation covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum Scope {
    /// Everything is stale; reload from the root.
    All,
    /// Only the listing of this exact directory may have changed.
    Path(NsPath),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("*"),
            Self::Path(path) => path.fmt(f),
        }
    }
}

/// Why a listing became stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationReason {
    /// An entry was created in the scoped directory.
    Created,
    /// An entry was renamed into or out of the scoped directory.
    Renamed,
    /// An entry was deleted from the scoped directory.
    Deleted,
    /// An upload into the scoped directory completed.
    Uploaded,
    /// A caller asked for a hard refresh.
    Refresh,
}

impl InvalidationReason {
    /// Short label used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Renamed => "renamed",
            Self::Deleted => "deleted",
            Self::Uploaded => "uploaded",
            Self::Refresh => "refresh",
        }
    }
}

/// "Something changed" signal carried by the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// What became stale.
    pub scope: Scope,
    /// The mutation that caused it.
    pub reason: InvalidationReason,
}

impl InvalidationEvent {
    /// Event scoped to the listing of one directory.
    #[must_use]
    pub fn path(path: NsPath, reason: InvalidationReason) -> Self {
        Self {
            metadata: EventMetadata::new(reason.as_str()),
            scope: Scope::Path(path),
            reason,
        }
    }

    /// Event that invalidates everything.
    #[must_use]
    pub fn all(reason: InvalidationReason) -> Self {
        Self {
            metadata: EventMetadata::new(reason.as_str()),
            scope: Scope::All,
            reason,
        }
    }

    /// Set the publishing component.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.metadata.source = source.into();
        self
    }

    /// True if the listing of `path` must be treated as stale.
    ///
    /// Ancestors and descendants of the scoped path are not affected.
    #[must_use]
    pub fn affects(&self, path: &NsPath) -> bool {
        match &self.scope {
            Scope::All => true,
            Scope::Path(scoped) => scoped == path,
        }
    }
}

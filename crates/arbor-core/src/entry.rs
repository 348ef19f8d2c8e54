use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One item of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Decoded entry name (a single path segment).
    pub name: String,
    /// True if the entry is a directory.
    pub is_dir: bool,
    /// Size in bytes. `None` for directories or when the server omits it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Last modification time, when the server reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

impl Entry {
    /// A directory entry without metadata.
    #[must_use]
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            size: None,
            modified: None,
        }
    }

    /// A file entry of the given size.
    #[must_use]
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            size: Some(size),
            modified: None,
        }
    }

    /// Attach a modification time.
    #[must_use]
    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{NamespaceError, NamespaceResult};

/// Identity of a namespace entry: an ordered sequence of decoded segments.
///
/// The empty sequence is the root. Equality, hashing and ordering operate on
/// the decoded segments, so two differently percent-encoded spellings of the
/// same path are the same key. Ordering puts every path before its
/// descendants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NsPath {
    segments: Vec<String>,
}

impl NsPath {
    /// The root of the namespace.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a slash-separated, possibly percent-encoded path.
    ///
    /// Empty segments (leading, trailing or doubled slashes) are dropped and
    /// each remaining segment is percent-decoded.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceError::InvalidName`] if a segment does not decode to
    /// UTF-8 or decodes to `.` or `..`.
    pub fn parse(raw: &str) -> NamespaceResult<Self> {
        let mut segments = Vec::new();
        for part in raw.split('/').filter(|s| !s.is_empty()) {
            let decoded = urlencoding::decode(part)
                .map_err(|e| NamespaceError::InvalidName(format!("{part}: {e}")))?;
            if decoded == "." || decoded == ".." {
                return Err(NamespaceError::InvalidName(format!(
                    "relative segment '{decoded}' in {raw}"
                )));
            }
            segments.push(decoded.into_owned());
        }
        Ok(Self { segments })
    }

    /// Build a path from already-decoded segments, validating each one.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceError::InvalidName`] if any segment fails
    /// [`validate_name`].
    pub fn from_segments<I, S>(segments: I) -> NamespaceResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments = segments
            .into_iter()
            .map(Into::into)
            .map(|s| validate_name(&s).map(|()| s))
            .collect::<NamespaceResult<Vec<_>>>()?;
        Ok(Self { segments })
    }

    /// Child path. `name` is a decoded segment as reported by a listing.
    #[must_use]
    pub fn join(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_owned());
        Self { segments }
    }

    /// Parent path, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    /// Last segment, or `None` for the root.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Decoded segments, root first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments (0 for the root).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// True for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Proper ancestors, root first. Empty for the root itself.
    #[must_use]
    pub fn ancestors(&self) -> Vec<Self> {
        (0..self.segments.len())
            .map(|len| Self {
                segments: self.segments[..len].to_vec(),
            })
            .collect()
    }

    /// True if `prefix` is this path or one of its ancestors.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Canonical decoded form without a leading slash (`""` for the root).
    #[must_use]
    pub fn canonical(&self) -> String {
        self.segments.join("/")
    }

    /// Request-target form: each segment percent-encoded independently.
    #[must_use]
    pub fn to_encoded(&self) -> String {
        self.segments
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for NsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.canonical())
    }
}

impl FromStr for NsPath {
    type Err = NamespaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NsPath {
    type Error = NamespaceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NsPath> for String {
    fn from(path: NsPath) -> Self {
        path.canonical()
    }
}

/// Check that `name` can be used as a single entry name.
///
/// # Errors
///
/// Returns [`NamespaceError::InvalidName`] for empty names, `.`, `..`, and
/// names containing `/`, `\` or NUL.
pub fn validate_name(name: &str) -> NamespaceResult<()> {
    if name.trim().is_empty() {
        return Err(NamespaceError::InvalidName("name cannot be empty".into()));
    }
    if name == "." || name == ".." {
        return Err(NamespaceError::InvalidName(format!(
            "'{name}' is not a valid entry name"
        )));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(NamespaceError::InvalidName(format!(
            "'{name}' contains a path separator"
        )));
    }
    Ok(())
}

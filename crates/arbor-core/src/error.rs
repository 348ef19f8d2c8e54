use thiserror::Error;

/// Errors reported by the remote namespace and by the layers built on it.
///
/// The type is `Clone` so that every caller joined onto one in-flight load
/// observes the same failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamespaceError {
    /// The path does not exist (or is not a directory when one was required).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The target name is already taken.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The remote store refused the operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A path segment or entry name is not acceptable.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Connectivity failure or timeout.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A concurrent mutation raced the caller's view of the namespace.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The server failed in a way that maps to no other variant.
    #[error("Remote error (HTTP {status}): {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The server answered with a body that could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Convenience result type for namespace operations.
pub type NamespaceResult<T> = Result<T, NamespaceError>;

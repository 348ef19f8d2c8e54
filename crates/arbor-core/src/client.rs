use async_trait::async_trait;

use crate::{Entry, NamespaceResult, NsPath};

/// Contract for the remote hierarchical store.
///
/// Implementations perform I/O only; nothing here caches. Paths are decoded
/// identities; implementations encode them when composing requests.
#[async_trait]
pub trait NamespaceClient: Send + Sync {
    /// List the direct children of a directory, in server order.
    ///
    /// Fails with `NotFound`, `PermissionDenied` or `Transport`.
    async fn list_directory(&self, path: &NsPath) -> NamespaceResult<Vec<Entry>>;

    /// Create a file or directory named `name` inside `parent`.
    ///
    /// Fails with `AlreadyExists`, or `NotFound` when the parent is missing.
    async fn create_entry(&self, parent: &NsPath, name: &str, is_dir: bool)
    -> NamespaceResult<()>;

    /// Move `old` to `new`. An existing destination is never overwritten.
    ///
    /// Fails with `NotFound`, `AlreadyExists` or `InvalidName`.
    async fn rename_entry(&self, old: &NsPath, new: &NsPath) -> NamespaceResult<()>;

    /// Delete a file or a whole directory subtree.
    ///
    /// Fails with `NotFound`.
    async fn delete_entry(&self, path: &NsPath) -> NamespaceResult<()>;
}

/// Whole-body file transfer, for clients that support it.
#[async_trait]
pub trait Transfer: Send + Sync {
    /// Store `content` as `parent/name`, replacing an existing file.
    async fn upload(&self, parent: &NsPath, name: &str, content: Vec<u8>) -> NamespaceResult<()>;

    /// Fetch the bytes of a file.
    async fn download(&self, path: &NsPath) -> NamespaceResult<Vec<u8>>;
}

//! Test fixtures for common namespaces.

use arbor_core::NsPath;

use crate::mocks::MockNamespace;

/// Parse a path literal.
///
/// # Panics
///
/// Panics if `raw` is not a valid path.
#[must_use]
pub fn p(raw: &str) -> NsPath {
    NsPath::parse(raw).unwrap_or_else(|e| panic!("bad test path {raw:?}: {e}"))
}

/// The namespace used across the navigation and invalidation tests:
///
/// ```text
/// /
/// ├── a/
/// │   ├── b/
/// │   │   └── c/
/// │   └── c/
/// └── docs/
///     └── report.txt
/// ```
#[must_use]
pub fn sample_namespace() -> MockNamespace {
    MockNamespace::new()
        .with_dir("a/b/c")
        .with_dir("a/c")
        .with_file("docs/report.txt", b"quarterly numbers\n")
}

#[cfg(test)]
mod tests {
    use arbor_core::NamespaceClient;

    use super::*;

    #[tokio::test]
    async fn test_sample_namespace_layout() {
        let mock = sample_namespace();
        let root: Vec<String> = mock
            .list_directory(&NsPath::root())
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(root, ["a", "docs"]);
        assert!(mock.exists(&p("a/b/c")));
        assert!(mock.exists(&p("docs/report.txt")));
    }

    #[test]
    fn test_p_decodes() {
        assert_eq!(p("/my%20docs/").segments(), ["my docs"]);
    }
}

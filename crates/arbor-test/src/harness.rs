//! Test harness helpers.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Set up test logging with the given filter.
///
/// Safe to call from every test; only the first call installs a subscriber.
///
/// # Example
///
/// ```rust,ignore
/// use arbor_test::setup_test_logging;
///
/// #[tokio::test]
/// async fn my_test() {
///     setup_test_logging("arbor_tree=debug");
///     // ... test code
/// }
/// ```
pub fn setup_test_logging(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .try_init();
}

/// Set up test logging at warn level.
pub fn setup_test_logging_default() {
    setup_test_logging("warn");
}

/// A temporary directory that lives as long as the test needs it.
#[derive(Debug)]
pub struct TestContext {
    /// Temporary directory for the test.
    pub dir: TempDir,
}

impl TestContext {
    /// Create a new test context.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: TempDir::with_prefix("arbor-test").expect("tempdir"),
        }
    }

    /// Path to the temporary directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file below the temporary directory, creating parents.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    #[must_use]
    pub fn write_file(&self, relative: &str, content: &[u8]) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture parents");
        }
        std::fs::write(&path, content).expect("write fixture file");
        path
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

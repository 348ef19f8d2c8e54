//! Shared harness for integration tests.
//!
//! [`TestServer`] serves a temporary directory over the same routes as the
//! reference backend, on an ephemeral port. Paths whose first segment starts
//! with `secret` answer 403 and paths starting with `broken` answer 500.

#![allow(dead_code)]

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use arbor_client::HttpNamespaceClient;
use arbor_core::NamespaceClient;
use arbor_events::InvalidationBus;
use arbor_listing::ListingView;
use arbor_tree::{ExpansionController, TreeCache};
use axum::{
    Json, Router,
    extract::{Multipart, Path as UrlPath, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

type Root = Arc<PathBuf>;
type Reply = Result<Response, (StatusCode, String)>;

#[derive(Serialize)]
struct WireEntry {
    name: String,
    size: u64,
    is_dir: bool,
    modified: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RenamePayload {
    old_path: String,
    new_path: String,
}

fn fail(status: StatusCode, message: impl Into<String>) -> (StatusCode, String) {
    (status, message.into())
}

fn io_fail(err: &std::io::Error) -> (StatusCode, String) {
    fail(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

/// Map a decoded request path onto the served directory.
fn resolve(root: &Path, raw: &str) -> Result<PathBuf, (StatusCode, String)> {
    let mut resolved = root.to_path_buf();
    for (index, component) in Path::new(raw.trim_matches('/')).components().enumerate() {
        let Component::Normal(part) = component else {
            return Err(fail(StatusCode::BAD_REQUEST, "invalid path"));
        };
        let part = part.to_string_lossy();
        if index == 0 && part.starts_with("secret") {
            return Err(fail(StatusCode::FORBIDDEN, "forbidden"));
        }
        if index == 0 && part.starts_with("broken") {
            return Err(fail(StatusCode::INTERNAL_SERVER_ERROR, "disk on fire"));
        }
        resolved.push(part.as_ref());
    }
    Ok(resolved)
}

fn list_dir(dir: &Path) -> Reply {
    if !dir.is_dir() {
        return Err(fail(StatusCode::NOT_FOUND, "directory not found"));
    }
    let mut entries = Vec::new();
    for item in fs::read_dir(dir).map_err(|e| io_fail(&e))? {
        let item = item.map_err(|e| io_fail(&e))?;
        let meta = item.metadata().map_err(|e| io_fail(&e))?;
        entries.push(WireEntry {
            name: item.file_name().to_string_lossy().into_owned(),
            size: if meta.is_file() { meta.len() } else { 0 },
            is_dir: meta.is_dir(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(entries).into_response())
}

async fn list_root(State(root): State<Root>) -> Reply {
    list_dir(&root)
}

async fn list(State(root): State<Root>, UrlPath(raw): UrlPath<String>) -> Reply {
    list_dir(&resolve(&root, &raw)?)
}

async fn create_path(
    State(root): State<Root>,
    uri: Uri,
    UrlPath(raw): UrlPath<String>,
) -> Reply {
    let target = resolve(&root, &raw)?;
    if target == *root.as_ref() {
        return Err(fail(StatusCode::BAD_REQUEST, "path cannot be empty"));
    }
    if uri.path().ends_with('/') {
        fs::create_dir_all(&target).map_err(|e| io_fail(&e))?;
    } else {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| io_fail(&e))?;
        }
        fs::File::create(&target).map_err(|e| io_fail(&e))?;
    }
    Ok("created".into_response())
}

async fn rename(State(root): State<Root>, Json(payload): Json<RenamePayload>) -> Reply {
    if payload.old_path.trim().is_empty() || payload.new_path.trim().is_empty() {
        return Err(fail(StatusCode::BAD_REQUEST, "both paths are required"));
    }
    let from = resolve(&root, &payload.old_path)?;
    let to = resolve(&root, &payload.new_path)?;
    if !from.exists() {
        return Err(fail(StatusCode::NOT_FOUND, "source path does not exist"));
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| io_fail(&e))?;
    }
    fs::rename(&from, &to).map_err(|e| io_fail(&e))?;
    Ok("renamed".into_response())
}

async fn remove(State(root): State<Root>, UrlPath(raw): UrlPath<String>) -> Reply {
    let target = resolve(&root, &raw)?;
    if target.is_dir() {
        fs::remove_dir_all(&target).map_err(|e| io_fail(&e))?;
    } else if target.is_file() {
        fs::remove_file(&target).map_err(|e| io_fail(&e))?;
    } else {
        return Err(fail(StatusCode::NOT_FOUND, "file or folder not found"));
    }
    Ok("deleted".into_response())
}

async fn store_upload(dir: PathBuf, mut multipart: Multipart) -> Reply {
    fs::create_dir_all(&dir).map_err(|e| io_fail(&e))?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| fail(StatusCode::BAD_REQUEST, e.to_string()))?
    {
        let name = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| fail(StatusCode::BAD_REQUEST, "missing file name"))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| fail(StatusCode::BAD_REQUEST, e.to_string()))?;
        fs::write(dir.join(name), &data).map_err(|e| io_fail(&e))?;
    }
    Ok("uploaded".into_response())
}

async fn upload_root(State(root): State<Root>, multipart: Multipart) -> Reply {
    store_upload(root.as_ref().clone(), multipart).await
}

async fn upload(
    State(root): State<Root>,
    UrlPath(raw): UrlPath<String>,
    multipart: Multipart,
) -> Reply {
    store_upload(resolve(&root, &raw)?, multipart).await
}

async fn download(State(root): State<Root>, UrlPath(raw): UrlPath<String>) -> Reply {
    let target = resolve(&root, &raw)?;
    if !target.is_file() {
        return Err(fail(StatusCode::NOT_FOUND, "file not found"));
    }
    let data = fs::read(&target).map_err(|e| io_fail(&e))?;
    Ok(data.into_response())
}

fn router(root: Root) -> Router {
    Router::new()
        .route("/uploads", get(list_root))
        .route("/uploads/{*path}", get(list))
        .route("/create_path/{*path}", post(create_path))
        .route("/rename", post(rename))
        .route("/delete/{*path}", delete(remove))
        .route("/upload/", post(upload_root))
        .route("/upload/{*path}", post(upload))
        .route("/download/{*path}", get(download))
        .with_state(root)
}

/// A file server over a temporary directory, stopped on drop.
pub struct TestServer {
    /// `http://127.0.0.1:{port}`.
    pub base_url: String,
    dir: TempDir,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Bind an ephemeral port and start serving an empty directory.
    pub async fn start() -> Self {
        let dir = TempDir::new().expect("failed to create tempdir");
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test server");
        let addr = listener.local_addr().expect("no local address");
        let app = router(Arc::new(dir.path().to_path_buf()));
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server failed");
        });

        Self {
            base_url: format!("http://{addr}"),
            dir,
            handle,
        }
    }

    /// Directory being served.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Create a directory (and its parents) on the server side.
    pub fn mkdir(&self, relative: &str) -> &Self {
        fs::create_dir_all(self.root().join(relative)).expect("failed to create dir");
        self
    }

    /// Write a file (and its parent directories) on the server side.
    pub fn write(&self, relative: &str, data: &[u8]) -> &Self {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        fs::write(path, data).expect("failed to write file");
        self
    }

    /// True if `relative` exists on the server side.
    pub fn exists(&self, relative: &str) -> bool {
        self.root().join(relative).exists()
    }

    /// A client pointed at this server.
    pub fn client(&self) -> HttpNamespaceClient {
        HttpNamespaceClient::new(&self.base_url).expect("valid base url")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Cache, expansion and listing wired to one client and one bus.
pub struct Stack {
    /// The shared bus.
    pub bus: InvalidationBus,
    /// Cache attached to `bus`.
    pub cache: Arc<TreeCache>,
    /// Controller over `cache`.
    pub expansion: Arc<ExpansionController>,
    /// Listing view over the same client.
    pub listing: Arc<ListingView>,
}

impl Stack {
    /// Wire everything around `client`.
    pub fn new(client: Arc<dyn NamespaceClient>) -> Self {
        arbor_test::setup_test_logging_default();
        let bus = InvalidationBus::new();
        let cache = TreeCache::new(Arc::clone(&client));
        cache.attach(&bus);
        let expansion = Arc::new(ExpansionController::new(Arc::clone(&cache)));
        let listing = Arc::new(ListingView::new(client));
        Self {
            bus,
            cache,
            expansion,
            listing,
        }
    }
}

/// Names of `entries`, in order.
pub fn names(entries: &[arbor_core::Entry]) -> Vec<String> {
    entries.iter().map(|e| e.name.clone()).collect()
}

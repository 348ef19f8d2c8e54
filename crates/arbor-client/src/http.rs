//! HTTP binding of the namespace contract.
//!
//! Routes, relative to the base URL:
//!
//! | Operation | Request |
//! |---|---|
//! | list | `GET uploads` or `GET uploads/{path}` |
//! | create | `POST create_path/{path}` (trailing `/` for a directory) |
//! | rename | `POST rename` with `{"old_path", "new_path"}` |
//! | delete | `DELETE delete/{path}` |
//! | upload | `POST upload/{parent}` multipart, field `file` |
//! | download | `GET download/{path}` |

use std::time::Duration;

use arbor_core::{
    Entry, NamespaceClient, NamespaceError, NamespaceResult, NsPath, Transfer, validate_name,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use url::Url;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default `User-Agent` header.
pub const DEFAULT_USER_AGENT: &str = concat!("arbor/", env!("CARGO_PKG_VERSION"));

/// Transport settings for [`HttpNamespaceClient`].
#[derive(Debug, Clone)]
pub struct HttpClientOptions {
    /// Whole-request timeout.
    pub timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for HttpClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpClientOptions {
    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// One item of a list response.
#[derive(Debug, Deserialize)]
struct WireEntry {
    name: String,
    #[serde(default)]
    size: u64,
    is_dir: bool,
    #[serde(default)]
    modified: Option<DateTime<Utc>>,
}

impl TryFrom<WireEntry> for Entry {
    type Error = NamespaceError;

    fn try_from(wire: WireEntry) -> NamespaceResult<Self> {
        validate_name(&wire.name).map_err(|e| {
            NamespaceError::InvalidResponse(format!("listing contains a bad name: {e}"))
        })?;
        let entry = if wire.is_dir {
            Entry::dir(wire.name)
        } else {
            Entry::file(wire.name, wire.size)
        };
        Ok(match wire.modified {
            Some(at) => entry.with_modified(at),
            None => entry,
        })
    }
}

#[derive(Debug, Serialize)]
struct RenameRequest {
    old_path: String,
    new_path: String,
}

/// Map a non-success status to the error taxonomy.
pub(crate) fn status_error(status: StatusCode, subject: &str, body: String) -> NamespaceError {
    let detail = if body.trim().is_empty() {
        subject.to_string()
    } else {
        format!("{subject}: {}", body.trim())
    };
    match status {
        StatusCode::NOT_FOUND => NamespaceError::NotFound(subject.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            NamespaceError::PermissionDenied(subject.to_string())
        },
        StatusCode::CONFLICT => NamespaceError::Conflict(detail),
        StatusCode::BAD_REQUEST => NamespaceError::InvalidName(detail),
        other => NamespaceError::Remote {
            status: other.as_u16(),
            message: body,
        },
    }
}

fn transport(err: &reqwest::Error) -> NamespaceError {
    if err.is_timeout() {
        NamespaceError::Transport(format!("request timed out: {err}"))
    } else {
        NamespaceError::Transport(err.to_string())
    }
}

/// Fail with `NotFound` unless `path` has a parent that lists it.
fn require_listed(listing: &[Entry], path: &NsPath) -> NamespaceResult<()> {
    let name = path.name().unwrap_or_default();
    if listing.iter().any(|e| e.name == name) {
        Ok(())
    } else {
        Err(NamespaceError::NotFound(path.to_string()))
    }
}

/// Fail with `AlreadyExists` if `listing` contains the name of `path`.
fn require_absent(listing: &[Entry], path: &NsPath) -> NamespaceResult<()> {
    let name = path.name().unwrap_or_default();
    if listing.iter().any(|e| e.name == name) {
        Err(NamespaceError::AlreadyExists(path.to_string()))
    } else {
        Ok(())
    }
}

/// [`NamespaceClient`] and [`Transfer`] over HTTP.
///
/// The server is lax about preconditions, so `create_entry` and
/// `rename_entry` list the affected parents first and fail with
/// `AlreadyExists` / `NotFound` before sending the mutation.
#[derive(Debug, Clone)]
pub struct HttpNamespaceClient {
    client: Client,
    base_url: String,
}

impl HttpNamespaceClient {
    /// Create a client with default options.
    ///
    /// # Errors
    ///
    /// See [`HttpNamespaceClient::with_options`].
    pub fn new(base_url: &str) -> NamespaceResult<Self> {
        Self::with_options(base_url, HttpClientOptions::default())
    }

    /// Create a client for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`NamespaceError::Transport`] if `base_url` is not an http or
    /// https URL or the HTTP client cannot be built.
    pub fn with_options(base_url: &str, options: HttpClientOptions) -> NamespaceResult<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| NamespaceError::Transport(format!("invalid base URL {base_url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(NamespaceError::Transport(format!(
                "unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent)
            .build()
            .map_err(|e| transport(&e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/{route}` for the root, `{base}/{route}/{encoded path}` otherwise.
    fn url(&self, route: &str, path: &NsPath) -> String {
        let encoded = path.to_encoded();
        if encoded.is_empty() {
            format!("{}/{route}", self.base_url)
        } else {
            format!("{}/{route}/{encoded}", self.base_url)
        }
    }

    async fn check(response: Response, subject: &NsPath) -> NamespaceResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = status_error(status, &subject.to_string(), body);
        if status.is_server_error() {
            error!(path = %subject, status = status.as_u16(), error = %err, "server error");
        }
        Err(err)
    }
}

#[async_trait]
impl NamespaceClient for HttpNamespaceClient {
    async fn list_directory(&self, path: &NsPath) -> NamespaceResult<Vec<Entry>> {
        let url = self.url("uploads", path);
        debug!(path = %path, url = %url, "GET listing");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport(&e))?;
        let body = Self::check(response, path)
            .await?
            .bytes()
            .await
            .map_err(|e| transport(&e))?;

        let wire: Vec<WireEntry> = serde_json::from_slice(&body)
            .map_err(|e| NamespaceError::InvalidResponse(format!("listing of {path}: {e}")))?;
        wire.into_iter().map(Entry::try_from).collect()
    }

    async fn create_entry(&self, parent: &NsPath, name: &str, is_dir: bool) -> NamespaceResult<()> {
        validate_name(name)?;
        let path = parent.join(name);
        require_absent(&self.list_directory(parent).await?, &path)?;

        let mut url = self.url("create_path", &path);
        if is_dir {
            url.push('/');
        }
        debug!(path = %path, is_dir, url = %url, "POST create");

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| transport(&e))?;
        Self::check(response, &path).await?;
        Ok(())
    }

    async fn rename_entry(&self, old: &NsPath, new: &NsPath) -> NamespaceResult<()> {
        let (Some(old_parent), Some(new_parent), Some(new_name)) =
            (old.parent(), new.parent(), new.name())
        else {
            return Err(NamespaceError::InvalidName("cannot rename the root".into()));
        };
        validate_name(new_name)?;
        if new.starts_with(old) {
            return Err(NamespaceError::InvalidName(format!(
                "cannot move {old} into itself"
            )));
        }

        require_listed(&self.list_directory(&old_parent).await?, old)?;
        require_absent(&self.list_directory(&new_parent).await?, new)?;

        let url = format!("{}/rename", self.base_url);
        debug!(from = %old, to = %new, "POST rename");

        let response = self
            .client
            .post(&url)
            .json(&RenameRequest {
                old_path: old.canonical(),
                new_path: new.canonical(),
            })
            .send()
            .await
            .map_err(|e| transport(&e))?;
        Self::check(response, old).await?;
        Ok(())
    }

    async fn delete_entry(&self, path: &NsPath) -> NamespaceResult<()> {
        if path.is_root() {
            return Err(NamespaceError::InvalidName("cannot delete the root".into()));
        }
        let url = self.url("delete", path);
        debug!(path = %path, url = %url, "DELETE entry");

        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| transport(&e))?;
        Self::check(response, path).await?;
        Ok(())
    }
}

#[async_trait]
impl Transfer for HttpNamespaceClient {
    async fn upload(&self, parent: &NsPath, name: &str, content: Vec<u8>) -> NamespaceResult<()> {
        validate_name(name)?;
        let mut url = self.url("upload", parent);
        if parent.is_root() {
            url.push('/');
        }
        debug!(parent = %parent, name, bytes = content.len(), "POST upload");

        let part = reqwest::multipart::Part::bytes(content).file_name(name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport(&e))?;
        Self::check(response, &parent.join(name)).await?;
        Ok(())
    }

    async fn download(&self, path: &NsPath) -> NamespaceResult<Vec<u8>> {
        let url = self.url("download", path);
        debug!(path = %path, url = %url, "GET download");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport(&e))?;
        let bytes = Self::check(response, path)
            .await?
            .bytes()
            .await
            .map_err(|e| transport(&e))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(raw: &str) -> NsPath {
        NsPath::parse(raw).unwrap()
    }

    #[test]
    fn test_urls_encode_each_segment() {
        let client = HttpNamespaceClient::new("http://localhost:4023/api/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:4023/api");
        assert_eq!(
            client.url("uploads", &NsPath::root()),
            "http://localhost:4023/api/uploads"
        );
        assert_eq!(
            client.url("uploads", &p("my docs/a#b")),
            "http://localhost:4023/api/uploads/my%20docs/a%23b"
        );
    }

    #[test]
    fn test_rejects_non_http_base() {
        assert!(matches!(
            HttpNamespaceClient::new("ftp://example.com"),
            Err(NamespaceError::Transport(_))
        ));
        assert!(HttpNamespaceClient::new("not a url").is_err());
    }

    #[test]
    fn test_status_mapping() {
        let map = |code: u16| {
            status_error(StatusCode::from_u16(code).unwrap(), "/x", "body".to_string())
        };
        assert!(matches!(map(404), NamespaceError::NotFound(_)));
        assert!(matches!(map(401), NamespaceError::PermissionDenied(_)));
        assert!(matches!(map(403), NamespaceError::PermissionDenied(_)));
        assert!(matches!(map(409), NamespaceError::Conflict(_)));
        assert!(matches!(map(400), NamespaceError::InvalidName(_)));
        assert_eq!(
            map(413),
            NamespaceError::Remote {
                status: 413,
                message: "body".into()
            }
        );
        assert!(matches!(map(500), NamespaceError::Remote { status: 500, .. }));
    }

    #[test]
    fn test_wire_entry_conversion() {
        let wire: Vec<WireEntry> = serde_json::from_str(
            r#"[
                {"name": "docs", "size": 0, "is_dir": true},
                {"name": "a.txt", "size": 12, "is_dir": false, "modified": "2024-05-01T10:00:00Z"}
            ]"#,
        )
        .unwrap();
        let entries: Vec<Entry> = wire
            .into_iter()
            .map(Entry::try_from)
            .collect::<NamespaceResult<_>>()
            .unwrap();

        assert_eq!(entries[0], Entry::dir("docs"));
        assert_eq!(entries[1].size, Some(12));
        assert!(entries[1].modified.is_some());
    }

    #[test]
    fn test_wire_entry_with_slash_is_rejected() {
        let wire = WireEntry {
            name: "a/b".into(),
            size: 0,
            is_dir: false,
            modified: None,
        };
        assert!(matches!(
            Entry::try_from(wire),
            Err(NamespaceError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_names_fail_before_io() {
        // Nothing listens on this port; reaching the network would give Transport.
        let client = HttpNamespaceClient::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(
            client.create_entry(&NsPath::root(), "..", true).await,
            Err(NamespaceError::InvalidName(_))
        ));
        assert!(matches!(
            client.rename_entry(&p("a"), &p("a/b")).await,
            Err(NamespaceError::InvalidName(_))
        ));
        assert!(matches!(
            client.delete_entry(&NsPath::root()).await,
            Err(NamespaceError::InvalidName(_))
        ));
        assert!(matches!(
            client.upload(&NsPath::root(), "", Vec::new()).await,
            Err(NamespaceError::InvalidName(_))
        ));
    }
}

//! webdav::client
//!
//! WebDAV client implementation using reqwest.
//!
//! # Requests
//!
//! | Operation      | Method     | Success statuses          |
//! |----------------|------------|---------------------------|
//! | `stat`         | `PROPFIND` | 207, 200                  |
//! | `read_stream`  | `GET`      | 2xx                       |
//! | `write_stream` | `PUT`      | 2xx                       |
//! | `mkdir_all`    | `MKCOL`    | 201, 405 (already exists) |
//!
//! 401 maps to [`StoreError::Unauthorized`], 404 to [`StoreError::NotFound`].
//!
//! # Authentication
//!
//! HTTP Basic credentials are attached to every request when present.
//! The client never retries; the transfer session owns the retry policy.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, Method, RequestBuilder, Response, StatusCode};
use tokio_util::io::{ReaderStream, StreamReader};
use url::Url;

use super::propfind;
use super::traits::{BoxReader, RemoteEntry, RemoteStore, StoreConnector, StoreError};
use crate::core::endpoint::BasicAuth;

/// User-Agent header value for requests.
const USER_AGENT_VALUE: &str = concat!("git-lfs-webdav/", env!("CARGO_PKG_VERSION"));

/// Request body asking for the two properties `stat` needs.
const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:propfind xmlns:D="DAV:"><D:prop><D:resourcetype/><D:getcontentlength/></D:prop></D:propfind>"#;

/// WebDAV client bound to one base URL and one set of credentials.
pub struct WebDavClient {
    /// HTTP client for making requests
    client: Client,
    /// Base URL, always ending in `/`
    base: Url,
    /// Basic auth credentials, if any
    auth: Option<BasicAuth>,
}

// Custom Debug to avoid exposing the password
impl std::fmt::Debug for WebDavClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDavClient")
            .field("base", &self.base.as_str())
            .field("auth", &self.auth)
            .finish()
    }
}

impl WebDavClient {
    /// Create a client for `base`.
    pub fn new(base: &Url, auth: Option<BasicAuth>) -> Result<Self, StoreError> {
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(USER_AGENT_VALUE)
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Ok(Self { client, base, auth })
    }

    /// The base URL (with trailing slash).
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve a store path against the base URL.
    fn url(&self, path: &str) -> Result<Url, StoreError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| StoreError::InvalidResponse(format!("bad path {:?}: {}", path, e)))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, StoreError> {
        let builder = self.client.request(method, self.url(path)?);
        Ok(match &self.auth {
            Some(auth) => builder.basic_auth(&auth.username, auth.password.as_ref()),
            None => builder,
        })
    }

    async fn send(
        &self,
        operation: &'static str,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<Response, StoreError> {
        tracing::debug!(operation, path, "webdav request");
        builder
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))
    }

    async fn mkcol(&self, path: &str) -> Result<(), StoreError> {
        let method = dav_method(b"MKCOL")?;
        let response = self.send("MKCOL", path, self.request(method, path)?).await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            // RFC 4918: MKCOL on an existing resource
            StatusCode::METHOD_NOT_ALLOWED => Ok(()),
            status => Err(status_error("MKCOL", path, status)),
        }
    }
}

#[async_trait]
impl RemoteStore for WebDavClient {
    async fn stat(&self, path: &str) -> Result<RemoteEntry, StoreError> {
        let method = dav_method(b"PROPFIND")?;
        let builder = self
            .request(method, path)?
            .header("Depth", "0")
            .header(CONTENT_TYPE, "application/xml; charset=utf-8")
            .body(PROPFIND_BODY);
        let response = self.send("PROPFIND", path, builder).await?;

        let status = response.status();
        if status != StatusCode::MULTI_STATUS && status != StatusCode::OK {
            return Err(status_error("PROPFIND", path, status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        let props = propfind::parse(&body).map_err(StoreError::InvalidResponse)?;

        let size = match (props.is_collection, props.content_length) {
            (_, Some(length)) => length,
            (true, None) => 0,
            (false, None) => {
                return Err(StoreError::InvalidResponse(format!(
                    "PROPFIND {}: no getcontentlength for a non-collection",
                    path
                )))
            }
        };
        Ok(RemoteEntry {
            path: path.to_string(),
            size,
            is_dir: props.is_collection,
        })
    }

    async fn read_stream(&self, path: &str) -> Result<BoxReader, StoreError> {
        let response = self
            .send("GET", path, self.request(Method::GET, path)?)
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error("GET", path, status));
        }

        let stream = response.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::new(StreamReader::new(Box::pin(stream))))
    }

    async fn write_stream(&self, path: &str, body: BoxReader, size: u64) -> Result<(), StoreError> {
        let builder = self
            .request(Method::PUT, path)?
            .header(CONTENT_LENGTH, HeaderValue::from(size))
            .body(Body::wrap_stream(ReaderStream::new(body)));
        let response = self.send("PUT", path, builder).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error("PUT", path, status));
        }
        Ok(())
    }

    async fn mkdir_all(&self, path: &str) -> Result<(), StoreError> {
        let mut prefix = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            prefix.push_str(segment);
            prefix.push('/');
            self.mkcol(&prefix).await?;
        }
        Ok(())
    }
}

/// Connector producing [`WebDavClient`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebDavConnector;

impl StoreConnector for WebDavConnector {
    fn connect(&self, base: &Url, auth: Option<&BasicAuth>) -> Result<Arc<dyn RemoteStore>, StoreError> {
        Ok(Arc::new(WebDavClient::new(base, auth.cloned())?))
    }
}

fn dav_method(name: &[u8]) -> Result<Method, StoreError> {
    Method::from_bytes(name).map_err(|e| StoreError::InvalidResponse(e.to_string()))
}

fn status_error(operation: &'static str, path: &str, status: StatusCode) -> StoreError {
    let path = path.to_string();
    match status {
        StatusCode::UNAUTHORIZED => StoreError::Unauthorized { operation, path },
        StatusCode::NOT_FOUND => StoreError::NotFound { operation, path },
        _ => StoreError::Status {
            operation,
            path,
            status: status.as_u16(),
        },
    }
}

//! webdav::traits
//!
//! Remote store trait definition.
//!
//! # Design
//!
//! The `RemoteStore` trait is async because every operation is network I/O.
//! Paths are relative to the store's base URL and always use `/`.
//!
//! Credentials are fixed per client: when the transfer session obtains new
//! credentials it asks its [`StoreConnector`] for a fresh client instead of
//! mutating the existing one.
//!
//! # Example
//!
//! ```ignore
//! use git_lfs_webdav::webdav::{RemoteStore, StoreError};
//!
//! async fn exists(store: &dyn RemoteStore, path: &str) -> Result<bool, StoreError> {
//!     match store.stat(path).await {
//!         Ok(entry) => Ok(entry.is_file()),
//!         Err(e) if e.is_not_found() => Ok(false),
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;
use url::Url;

use crate::core::endpoint::BasicAuth;

/// Owned byte stream used for remote reads and writes.
pub type BoxReader = Box<dyn AsyncRead + Send + Unpin>;

/// Errors from remote store operations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The server refused the request for lack of valid credentials (401).
    #[error("{operation} {path}: Authorize failed")]
    Unauthorized {
        /// Operation that was attempted
        operation: &'static str,
        /// Path relative to the base URL
        path: String,
    },

    /// The requested resource does not exist (404).
    #[error("{operation} {path}: Not Found")]
    NotFound {
        /// Operation that was attempted
        operation: &'static str,
        /// Path relative to the base URL
        path: String,
    },

    /// The server answered with another unexpected status.
    #[error("{operation} {path}: unexpected status {status}")]
    Status {
        /// Operation that was attempted
        operation: &'static str,
        /// Path relative to the base URL
        path: String,
        /// HTTP status code
        status: u16,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    Network(String),

    /// The server's response could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Local I/O feeding a request failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl StoreError {
    /// Whether fresh credentials might make the request succeed.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, StoreError::Unauthorized { .. })
    }

    /// Whether the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Metadata of a remote entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Path relative to the base URL
    pub path: String,
    /// Content length in bytes (0 for collections)
    pub size: u64,
    /// Whether the entry is a collection (directory)
    pub is_dir: bool,
}

impl RemoteEntry {
    /// Whether the entry is a regular file.
    pub fn is_file(&self) -> bool {
        !self.is_dir
    }
}

/// Trait for remote object stores.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Get metadata of `path`.
    async fn stat(&self, path: &str) -> Result<RemoteEntry, StoreError>;

    /// Open `path` for reading.
    async fn read_stream(&self, path: &str) -> Result<BoxReader, StoreError>;

    /// Write `size` bytes from `body` to `path`, replacing any existing file.
    async fn write_stream(&self, path: &str, body: BoxReader, size: u64) -> Result<(), StoreError>;

    /// Create `path` and all missing parents as collections.
    ///
    /// Existing collections are not an error.
    async fn mkdir_all(&self, path: &str) -> Result<(), StoreError>;
}

/// Builds store clients bound to a base URL and credentials.
pub trait StoreConnector: Send + Sync {
    /// Create a client for `base`. `auth: None` means anonymous.
    fn connect(&self, base: &Url, auth: Option<&BasicAuth>) -> Result<Arc<dyn RemoteStore>, StoreError>;
}

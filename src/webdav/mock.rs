//! webdav::mock
//!
//! Mock remote store for deterministic testing.
//!
//! # Design
//!
//! The mock keeps files and collections in memory and records every
//! operation. It can require specific Basic credentials, for every
//! operation or for one kind only; a call made by a client connected with
//! other credentials fails with [`StoreError::Unauthorized`]. A rejected
//! write still consumes its body, like a streamed PUT answered with 401.
//! It can also be told to fail one kind of operation with a given error.
//!
//! `MockStore` is its own [`StoreConnector`]: connecting returns a handle
//! sharing the same state, bound to the given credentials.
//!
//! # Example
//!
//! ```
//! use git_lfs_webdav::webdav::mock::MockStore;
//! use git_lfs_webdav::webdav::RemoteStore;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let store = MockStore::new();
//! store.put_file("ab/cd/abcd1234", b"0123456789");
//!
//! let entry = store.stat("ab/cd/abcd1234").await.unwrap();
//! assert_eq!(entry.size, 10);
//! assert!(store.stat("ab").await.unwrap().is_dir);
//! # });
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use url::Url;

use super::traits::{BoxReader, RemoteEntry, RemoteStore, StoreConnector, StoreError};
use crate::core::endpoint::BasicAuth;

/// Mock store.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones and
/// connected handles share state.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    inner: Arc<Mutex<MockStoreInner>>,
    /// Credentials this handle was connected with
    auth: Option<BasicAuth>,
}

#[derive(Debug, Default)]
struct MockStoreInner {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    required_auth: Option<BasicAuth>,
    /// Operation kind the required credentials apply to; all if unset
    auth_scope: Option<OpKind>,
    fail_on: Option<FailOn>,
    operations: Vec<StoreOperation>,
    connections: Vec<Option<BasicAuth>>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    Stat(StoreError),
    Read(StoreError),
    Write(StoreError),
    Mkdir(StoreError),
}

/// Kind of a store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Stat,
    Read,
    Write,
    Mkdir,
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    Stat { path: String },
    Read { path: String },
    Write { path: String, size: u64 },
    Mkdir { path: String },
}

impl StoreOperation {
    pub fn kind(&self) -> OpKind {
        match self {
            StoreOperation::Stat { .. } => OpKind::Stat,
            StoreOperation::Read { .. } => OpKind::Read,
            StoreOperation::Write { .. } => OpKind::Write,
            StoreOperation::Mkdir { .. } => OpKind::Mkdir,
        }
    }
}

impl MockStore {
    /// Create an empty, anonymous store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require these credentials for every operation.
    pub fn require_auth(self, username: &str, password: &str) -> Self {
        self.lock().required_auth = Some(BasicAuth {
            username: username.into(),
            password: Some(password.into()),
        });
        self
    }

    /// Require these credentials for operations of `kind` only.
    pub fn require_auth_on(self, kind: OpKind, username: &str, password: &str) -> Self {
        self.lock().auth_scope = Some(kind);
        self.require_auth(username, password)
    }

    /// Fail one kind of operation.
    pub fn fail_on(self, fail: FailOn) -> Self {
        self.lock().fail_on = Some(fail);
        self
    }

    /// Store a file, creating its parent collections.
    pub fn put_file(&self, path: &str, content: &[u8]) {
        let mut inner = self.lock();
        add_parents(&mut inner.dirs, path);
        inner.files.insert(path.to_string(), content.to_vec());
    }

    /// Create a collection and its parents.
    pub fn put_dir(&self, path: &str) {
        let mut inner = self.lock();
        add_parents(&mut inner.dirs, path);
        inner.dirs.insert(path.trim_end_matches('/').to_string());
    }

    /// Content of a stored file.
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().files.get(path).cloned()
    }

    /// Whether a collection exists.
    pub fn has_dir(&self, path: &str) -> bool {
        self.lock().dirs.contains(path)
    }

    /// All operations performed so far, across all handles.
    pub fn operations(&self) -> Vec<StoreOperation> {
        self.lock().operations.clone()
    }

    /// Number of operations of `kind` performed so far.
    pub fn count(&self, kind: OpKind) -> usize {
        self.lock()
            .operations
            .iter()
            .filter(|op| op.kind() == kind)
            .count()
    }

    /// Number of write operations performed so far.
    pub fn write_count(&self) -> usize {
        self.count(OpKind::Write)
    }

    /// Credentials of every `connect` call so far.
    pub fn connections(&self) -> Vec<Option<BasicAuth>> {
        self.lock().connections.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockStoreInner> {
        self.inner.lock().expect("mock store lock poisoned")
    }

    /// Record `op` and apply auth and failure injection.
    fn begin(&self, op: StoreOperation, operation: &'static str, path: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.operations.push(op.clone());

        if let Some(required) = &inner.required_auth {
            let guarded = inner.auth_scope.map_or(true, |kind| kind == op.kind());
            if guarded && self.auth.as_ref() != Some(required) {
                return Err(StoreError::Unauthorized {
                    operation,
                    path: path.to_string(),
                });
            }
        }

        let injected = match (&inner.fail_on, &op) {
            (Some(FailOn::Stat(e)), StoreOperation::Stat { .. })
            | (Some(FailOn::Read(e)), StoreOperation::Read { .. })
            | (Some(FailOn::Write(e)), StoreOperation::Write { .. })
            | (Some(FailOn::Mkdir(e)), StoreOperation::Mkdir { .. }) => Some(e.clone()),
            _ => None,
        };
        match injected {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn add_parents(dirs: &mut BTreeSet<String>, path: &str) {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    for i in 1..segments.len() {
        dirs.insert(segments[..i].join("/"));
    }
}

#[async_trait]
impl RemoteStore for MockStore {
    async fn stat(&self, path: &str) -> Result<RemoteEntry, StoreError> {
        self.begin(StoreOperation::Stat { path: path.into() }, "PROPFIND", path)?;
        let inner = self.lock();
        let key = path.trim_end_matches('/');
        if let Some(content) = inner.files.get(key) {
            return Ok(RemoteEntry {
                path: path.to_string(),
                size: content.len() as u64,
                is_dir: false,
            });
        }
        if inner.dirs.contains(key) {
            return Ok(RemoteEntry {
                path: path.to_string(),
                size: 0,
                is_dir: true,
            });
        }
        Err(StoreError::NotFound {
            operation: "PROPFIND",
            path: path.to_string(),
        })
    }

    async fn read_stream(&self, path: &str) -> Result<BoxReader, StoreError> {
        self.begin(StoreOperation::Read { path: path.into() }, "GET", path)?;
        match self.lock().files.get(path) {
            Some(content) => Ok(Box::new(std::io::Cursor::new(content.clone()))),
            None => Err(StoreError::NotFound {
                operation: "GET",
                path: path.to_string(),
            }),
        }
    }

    async fn write_stream(&self, path: &str, mut body: BoxReader, size: u64) -> Result<(), StoreError> {
        let mut content = Vec::new();
        body.read_to_end(&mut content)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        self.begin(
            StoreOperation::Write {
                path: path.into(),
                size,
            },
            "PUT",
            path,
        )?;

        let parent = path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or_default();
        let mut inner = self.lock();
        if !parent.is_empty() && !inner.dirs.contains(parent) {
            return Err(StoreError::Status {
                operation: "PUT",
                path: path.to_string(),
                status: 409,
            });
        }
        inner.files.insert(path.to_string(), content);
        Ok(())
    }

    async fn mkdir_all(&self, path: &str) -> Result<(), StoreError> {
        self.begin(StoreOperation::Mkdir { path: path.into() }, "MKCOL", path)?;
        let mut inner = self.lock();
        add_parents(&mut inner.dirs, path);
        inner.dirs.insert(path.trim_end_matches('/').to_string());
        Ok(())
    }
}

impl StoreConnector for MockStore {
    fn connect(&self, _base: &Url, auth: Option<&BasicAuth>) -> Result<Arc<dyn RemoteStore>, StoreError> {
        self.lock().connections.push(auth.cloned());
        Ok(Arc::new(MockStore {
            inner: Arc::clone(&self.inner),
            auth: auth.cloned(),
        }))
    }
}

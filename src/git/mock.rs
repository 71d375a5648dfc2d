//! git::mock
//!
//! In-memory repository for deterministic testing.
//!
//! # Example
//!
//! ```
//! use git_lfs_webdav::git::mock::MockRepo;
//! use git_lfs_webdav::git::{ConfigScope, Repo};
//!
//! let repo = MockRepo::new("/work/.git");
//! repo.config_set(&ConfigScope::lfs_config(), "lfs.url", "webdav://dav.example.com/").unwrap();
//! assert_eq!(
//!     repo.config_get(&ConfigScope::lfs_config(), "lfs.url").unwrap().as_deref(),
//!     Some("webdav://dav.example.com/")
//! );
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::traits::{ConfigScope, GitError, Repo};

/// Mock repository.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockRepo {
    inner: Arc<Mutex<MockRepoInner>>,
}

#[derive(Debug)]
struct MockRepoInner {
    git_dir: Result<PathBuf, GitError>,
    values: HashMap<(ConfigScope, String), String>,
    failing_scopes: HashMap<ConfigScope, String>,
}

impl MockRepo {
    /// Create a mock repository whose `.git` directory is `git_dir`.
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockRepoInner {
                git_dir: Ok(git_dir.into()),
                values: HashMap::new(),
                failing_scopes: HashMap::new(),
            })),
        }
    }

    /// A mock that behaves like a directory outside any repository.
    pub fn not_a_repo() -> Self {
        let repo = Self::new("");
        repo.lock().git_dir = Err(GitError::NotARepo {
            path: PathBuf::from("."),
        });
        repo
    }

    /// Builder-style config preset.
    pub fn with_config(self, scope: ConfigScope, name: &str, value: &str) -> Self {
        self.lock()
            .values
            .insert((scope, name.to_string()), value.to_string());
        self
    }

    /// Make every access to `scope` fail with `message`.
    pub fn fail_scope(self, scope: ConfigScope, message: &str) -> Self {
        self.lock().failing_scopes.insert(scope, message.to_string());
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockRepoInner> {
        self.inner.lock().expect("mock repo lock poisoned")
    }
}

impl MockRepoInner {
    fn check(&self, scope: &ConfigScope, operation: &'static str, name: &str) -> Result<(), GitError> {
        match self.failing_scopes.get(scope) {
            Some(message) => Err(GitError::Config {
                operation,
                name: name.to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Repo for MockRepo {
    fn git_dir(&self) -> Result<PathBuf, GitError> {
        self.lock().git_dir.clone()
    }

    fn config_get(&self, scope: &ConfigScope, name: &str) -> Result<Option<String>, GitError> {
        let inner = self.lock();
        inner.check(scope, "get", name)?;
        Ok(inner.values.get(&(scope.clone(), name.to_string())).cloned())
    }

    fn config_set(&self, scope: &ConfigScope, name: &str, value: &str) -> Result<(), GitError> {
        let mut inner = self.lock();
        inner.check(scope, "set", name)?;
        inner
            .values
            .insert((scope.clone(), name.to_string()), value.to_string());
        Ok(())
    }

    fn config_unset(&self, scope: &ConfigScope, name: &str) -> Result<(), GitError> {
        let mut inner = self.lock();
        inner.check(scope, "unset", name)?;
        inner.values.remove(&(scope.clone(), name.to_string()));
        Ok(())
    }
}

//! git::interface
//!
//! Repository implementation using git2.
//!
//! This module is the only place that imports `git2`. It discovers the
//! repository from a starting directory and maps git2 failures into
//! [`GitError`] categories. A missing config key is `Ok(None)`.
//!
//! # Example
//!
//! ```ignore
//! use git_lfs_webdav::git::{ConfigScope, Git, Repo};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let url = git.config_get(&ConfigScope::lfs_config(), "lfs.url")?;
//! ```

use std::path::{Path, PathBuf};

use super::traits::{ConfigScope, GitError, Repo};

/// git2-backed repository access.
///
/// Holds only the starting directory; the repository is discovered on each
/// call, so a missing repository is reported by the call that needs it.
pub struct Git {
    /// Directory the repository is discovered from
    start: PathBuf,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git").field("start", &self.start).finish()
    }
}

impl Git {
    /// Create a repository handle discovered lazily from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { start: path.into() }
    }

    /// Open the repository containing `path`, failing early if there is none.
    ///
    /// # Errors
    ///
    /// [`GitError::NotARepo`] if no repository is found.
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let git = Self::new(path);
        git.repo()?;
        Ok(git)
    }

    fn repo(&self) -> Result<git2::Repository, GitError> {
        git2::Repository::discover(&self.start).map_err(|_| GitError::NotARepo {
            path: self.start.clone(),
        })
    }

    /// Resolve a config file path against the work-tree root.
    ///
    /// Bare repositories have no work tree; the start directory is used.
    fn resolve_file(&self, path: &Path) -> Result<PathBuf, GitError> {
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        let repo = self.repo()?;
        let base = repo
            .workdir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.start.clone());
        Ok(base.join(path))
    }

    fn open_config(&self, scope: &ConfigScope, for_write: bool) -> Result<Option<git2::Config>, GitError> {
        match scope {
            ConfigScope::Repository => {
                let repo = self.repo()?;
                let config = repo.config().map_err(|e| access_error(repo.path(), e))?;
                if for_write {
                    let local = config
                        .open_level(git2::ConfigLevel::Local)
                        .map_err(|e| access_error(repo.path(), e))?;
                    Ok(Some(local))
                } else {
                    Ok(Some(config))
                }
            }
            ConfigScope::File(path) => {
                let path = self.resolve_file(path)?;
                if !for_write && !path.exists() {
                    return Ok(None);
                }
                git2::Config::open(&path)
                    .map(Some)
                    .map_err(|e| access_error(&path, e))
            }
        }
    }
}

impl Repo for Git {
    fn git_dir(&self) -> Result<PathBuf, GitError> {
        let repo = self.repo()?;
        std::fs::canonicalize(repo.path()).map_err(|e| GitError::AccessError {
            path: repo.path().to_path_buf(),
            message: e.to_string(),
        })
    }

    fn config_get(&self, scope: &ConfigScope, name: &str) -> Result<Option<String>, GitError> {
        let Some(config) = self.open_config(scope, false)? else {
            return Ok(None);
        };
        match config.get_string(name) {
            Ok(value) => Ok(Some(value.trim().to_string())),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(config_error("get", name, e)),
        }
    }

    fn config_set(&self, scope: &ConfigScope, name: &str, value: &str) -> Result<(), GitError> {
        if let Some(mut config) = self.open_config(scope, true)? {
            config
                .set_str(name, value)
                .map_err(|e| config_error("set", name, e))?;
        }
        Ok(())
    }

    fn config_unset(&self, scope: &ConfigScope, name: &str) -> Result<(), GitError> {
        if let ConfigScope::File(path) = scope {
            if !self.resolve_file(path)?.exists() {
                return Ok(());
            }
        }
        let Some(mut config) = self.open_config(scope, true)? else {
            return Ok(());
        };
        match config.remove(name) {
            Ok(()) => Ok(()),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(()),
            Err(e) => Err(config_error("unset", name, e)),
        }
    }
}

fn config_error(operation: &'static str, name: &str, err: git2::Error) -> GitError {
    GitError::Config {
        operation,
        name: name.to_string(),
        message: err.message().to_string(),
    }
}

fn access_error(path: &Path, err: git2::Error) -> GitError {
    GitError::AccessError {
        path: path.to_path_buf(),
        message: err.message().to_string(),
    }
}

//! git::traits
//!
//! Repository collaborator trait definition.
//!
//! # Design
//!
//! The transfer agent needs three things from the repository it runs in:
//! the absolute `.git` directory (downloads are staged below it) and
//! get/set/unset on git config values, either in the repository config or
//! in an explicit config file such as the committed `.lfsconfig`.
//!
//! The `Repo` trait keeps the transfer session and the commands
//! independent of `git2`, so they can be driven by [`MockRepo`] in tests.
//!
//! [`MockRepo`]: super::mock::MockRepo

use std::path::PathBuf;

use thiserror::Error;

/// Name of the committed config file holding the shared LFS URL.
pub const LFS_CONFIG_FILE: &str = ".lfsconfig";

/// Errors from repository operations.
#[derive(Debug, Clone, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Reading or writing a config value failed.
    #[error("config {operation} of '{name}' failed: {message}")]
    Config {
        /// get, set or unset
        operation: &'static str,
        /// Dotted config key
        name: String,
        /// Underlying error message
        message: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error at {path}: {message}")]
    AccessError {
        /// The path being accessed
        path: PathBuf,
        /// Description of the error
        message: String,
    },
}

/// Which config store an operation targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConfigScope {
    /// The repository config. Reads see all levels (system, global,
    /// local) like `git config --get`; writes go to `.git/config`.
    Repository,
    /// An explicit config file. Relative paths resolve against the
    /// work-tree root. A missing file reads as empty.
    File(PathBuf),
}

impl ConfigScope {
    /// The committed `.lfsconfig` file.
    pub fn lfs_config() -> Self {
        ConfigScope::File(PathBuf::from(LFS_CONFIG_FILE))
    }
}

impl std::fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigScope::Repository => write!(f, "repository config"),
            ConfigScope::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Trait for the repository the agent runs in.
///
/// # Config keys
///
/// Keys are dotted names like `lfs.url`. A key that is not set is
/// `Ok(None)`, never an error.
pub trait Repo {
    /// Absolute, symlink-resolved path of the `.git` directory.
    fn git_dir(&self) -> Result<PathBuf, GitError>;

    /// Get a config value.
    fn config_get(&self, scope: &ConfigScope, name: &str) -> Result<Option<String>, GitError>;

    /// Set a config value, creating the file for [`ConfigScope::File`] if needed.
    fn config_set(&self, scope: &ConfigScope, name: &str, value: &str) -> Result<(), GitError>;

    /// Remove a config value.
    ///
    /// Returns `Ok(())` even if the value was not set.
    fn config_unset(&self, scope: &ConfigScope, name: &str) -> Result<(), GitError>;
}

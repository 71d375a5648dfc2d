//! git
//!
//! Single interface for repository access.
//!
//! # Architecture
//!
//! This module is the **only doorway** to Git. The agent never shells out
//! to `git config` or `git rev-parse`; config values and the `.git`
//! directory are read through `git2` behind the [`Repo`] trait. No other
//! module should import `git2`.
//!
//! The one exception to "no git subprocesses" is the credential helper,
//! which lives in [`crate::credentials`] because `git credential` is the
//! protocol users configure their helpers for.
//!
//! # Responsibilities
//!
//! - Repository discovery and the absolute `.git` path
//! - Config get/set/unset in the repository config or an explicit file
//!
//! # Example
//!
//! ```ignore
//! use git_lfs_webdav::git::{ConfigScope, Git, Repo};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! git.config_set(&ConfigScope::Repository, "lfs.standalonetransferagent", "webdav")?;
//! ```

mod interface;
pub mod mock;
mod traits;

pub use interface::Git;
pub use traits::{ConfigScope, GitError, Repo, LFS_CONFIG_FILE};

/// Config key of the LFS endpoint URL.
pub const LFS_URL_KEY: &str = "lfs.url";

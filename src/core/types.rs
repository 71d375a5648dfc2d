//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`ObjectId`] - Git LFS object identifier (content hash)
//!
//! # Validation
//!
//! These types enforce validity at construction time. An `ObjectId` that
//! exists can always be turned into a remote path, so the transfer handlers
//! never slice a string that is too short.
//!
//! # Examples
//!
//! ```
//! use git_lfs_webdav::core::types::ObjectId;
//!
//! let oid = ObjectId::new("abcd1234").unwrap();
//! assert_eq!(oid.remote_dir(), "ab/cd");
//! assert_eq!(oid.remote_path(), "ab/cd/abcd1234");
//!
//! assert!(ObjectId::new("abc").is_err());
//! assert!(ObjectId::new("../etc/passwd").is_err());
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id: {0}")]
    InvalidOid(String),
}

/// A validated Git LFS object id.
///
/// Git LFS uses the lowercase hex SHA-256 of the content. The id is kept
/// exactly as received (no case normalization) because every response must
/// echo the id git-lfs sent.
///
/// The remote layout is two levels of fan-out followed by the full id:
/// `<id[0:2]>/<id[2:4]>/<id>`. Paths are always built with `/`, independent
/// of the host path separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Minimum length needed to build the two fan-out directories.
    pub const MIN_LEN: usize = 4;

    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the id is shorter than
    /// [`ObjectId::MIN_LEN`] or contains anything but ASCII hex digits.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into();
        Self::validate(&oid)?;
        Ok(Self(oid))
    }

    fn validate(oid: &str) -> Result<(), TypeError> {
        if oid.len() < Self::MIN_LEN {
            return Err(TypeError::InvalidOid(format!(
                "expected at least {} hex characters, got {}",
                Self::MIN_LEN,
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// The two-level directory prefix, e.g. `ab/cd`.
    pub fn remote_dir(&self) -> String {
        format!("{}/{}", &self.0[0..2], &self.0[2..4])
    }

    /// The object path relative to the store base URL, e.g. `ab/cd/abcd1234`.
    pub fn remote_path(&self) -> String {
        format!("{}/{}", self.remote_dir(), self.0)
    }

    /// Staging path for a download: `<git-dir>/lfs/tmp/<oid>.tmp`.
    ///
    /// git-lfs renames this file into its object store, so it has to live on
    /// the same filesystem as the `.git` directory.
    pub fn staging_path(&self, git_dir: &Path) -> PathBuf {
        staging_dir(git_dir).join(format!("{}.tmp", self.0))
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Directory holding in-flight downloads: `<git-dir>/lfs/tmp`.
pub fn staging_dir(git_dir: &Path) -> PathBuf {
    git_dir.join("lfs").join("tmp")
}

impl TryFrom<String> for ObjectId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ObjectId> for String {
    fn from(oid: ObjectId) -> Self {
        oid.0
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA256: &str = "4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393";

    #[test]
    fn accepts_full_sha256() {
        let oid = ObjectId::new(SHA256).unwrap();
        assert_eq!(oid.as_str(), SHA256);
        assert_eq!(oid.remote_dir(), "4d/7a");
        assert_eq!(oid.remote_path(), format!("4d/7a/{}", SHA256));
    }

    #[test]
    fn keeps_case_as_received() {
        let oid = ObjectId::new("ABCD1234").unwrap();
        assert_eq!(oid.to_string(), "ABCD1234");
        assert_eq!(oid.remote_path(), "AB/CD/ABCD1234");
    }

    #[test]
    fn minimum_length_is_four() {
        assert!(ObjectId::new("abcd").is_ok());
        assert!(ObjectId::new("abc").is_err());
        assert!(ObjectId::new("").is_err());
    }

    #[test]
    fn rejects_path_characters() {
        assert!(ObjectId::new("ab/cd1234").is_err());
        assert!(ObjectId::new("ab\\cd1234").is_err());
        assert!(ObjectId::new("..abcd").is_err());
        assert!(ObjectId::new("xyz12345").is_err());
    }

    #[test]
    fn staging_path_is_under_lfs_tmp() {
        let oid = ObjectId::new("abcd1234").unwrap();
        let path = oid.staging_path(Path::new("/repo/.git"));
        assert_eq!(path, Path::new("/repo/.git/lfs/tmp/abcd1234.tmp"));
    }

    #[test]
    fn serde_rejects_invalid() {
        let ok: Result<ObjectId, _> = serde_json::from_str("\"abcd1234\"");
        assert!(ok.is_ok());
        let bad: Result<ObjectId, _> = serde_json::from_str("\"zz\"");
        assert!(bad.is_err());
    }
}

//! credentials::traits
//!
//! Credential helper trait definition.
//!
//! # Design
//!
//! Credentials are exchanged as a flat key/value mapping, the same shape
//! `git credential` reads and writes (`url`, `protocol`, `host`, `path`,
//! `username`, `password`, ...). The mapping is a `BTreeMap` so the wire
//! form is deterministic.
//!
//! # Security
//!
//! Implementations MUST:
//! - Never log, print, or include credential values in error messages
//! - Be thread-safe (Send + Sync)

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

/// A set of credential attributes.
pub type Credentials = BTreeMap<String, String>;

/// Errors from credential helper operations.
///
/// Note: Error messages intentionally do not include credential values.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The helper process could not be started.
    #[error("'git credential {subcommand}' could not be started: {message}")]
    Spawn {
        subcommand: &'static str,
        message: String,
    },

    /// The helper exited unsuccessfully.
    #[error("'git credential {subcommand}' failed with: {status}")]
    Failed {
        subcommand: &'static str,
        status: String,
    },

    /// Talking to the helper process failed.
    #[error("'git credential {subcommand}' I/O error: {message}")]
    Io {
        subcommand: &'static str,
        message: String,
    },
}

/// Trait for credential helpers.
///
/// # Example
///
/// ```ignore
/// use git_lfs_webdav::credentials::{CredentialHelper, Credentials};
///
/// async fn lookup(helper: &dyn CredentialHelper) -> Option<Credentials> {
///     let mut query = Credentials::new();
///     query.insert("url".into(), "https://dav.example.com/lfs".into());
///     let found = helper.fill(&query).await.ok()?;
///     (!found.is_empty()).then_some(found)
/// }
/// ```
#[async_trait]
pub trait CredentialHelper: Send + Sync {
    /// Ask the helper to complete `input` with a username and password.
    ///
    /// Returns an empty mapping when the helper has nothing to offer
    /// (`git credential fill` exiting with status 128).
    async fn fill(&self, input: &Credentials) -> Result<Credentials, CredentialError>;

    /// Tell the helper that `credentials` worked.
    async fn approve(&self, credentials: &Credentials) -> Result<(), CredentialError>;

    /// Tell the helper that `credentials` were refused.
    async fn reject(&self, credentials: &Credentials) -> Result<(), CredentialError>;
}

/// Serialize credentials as `key=value` lines.
pub fn encode(credentials: &Credentials) -> String {
    credentials
        .iter()
        .map(|(key, value)| format!("{}={}\n", key, value))
        .collect()
}

/// Parse `key=value` lines.
///
/// Lines without `=` and lines with an empty value are dropped. Only the
/// first `=` separates key and value.
pub fn decode(output: &str) -> Credentials {
    output
        .lines()
        .filter_map(|line| line.split_once('='))
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_writes_sorted_lines() {
        let mut creds = Credentials::new();
        creds.insert("username".into(), "alice".into());
        creds.insert("host".into(), "dav.example.com".into());
        assert_eq!(encode(&creds), "host=dav.example.com\nusername=alice\n");
    }

    #[test]
    fn encode_empty() {
        assert_eq!(encode(&Credentials::new()), "");
    }

    #[test]
    fn decode_drops_malformed_and_empty() {
        let creds = decode("protocol=https\nnoequals\nusername=\npassword=a=b\n\n");
        assert_eq!(creds.len(), 2);
        assert_eq!(creds["protocol"], "https");
        assert_eq!(creds["password"], "a=b");
        assert!(!creds.contains_key("username"));
    }

    #[test]
    fn decode_handles_crlf() {
        let creds = decode("username=alice\r\npassword=pw\r\n");
        assert_eq!(creds["username"], "alice");
        assert_eq!(creds["password"], "pw");
    }

    #[test]
    fn error_display_formatting() {
        let err = CredentialError::Failed {
            subcommand: "approve",
            status: "exit status: 1".into(),
        };
        assert!(err.to_string().contains("git credential approve"));
        assert!(err.to_string().contains("exit status: 1"));
    }
}

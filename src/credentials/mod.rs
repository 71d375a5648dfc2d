//! credentials
//!
//! Bridge to the user's git credential helpers.
//!
//! # Architecture
//!
//! Credentials are obtained through the [`CredentialHelper`] trait:
//!
//! - [`GitCredentialHelper`]: runs `git credential fill|approve|reject`
//! - [`mock::MockCredentialHelper`]: in-memory, for tests
//!
//! The wire form is one `key=value` per line ([`encode`], [`decode`]).
//!
//! # Security
//!
//! - Credential values are **never** logged or included in error messages
//! - Terminal prompting by git is disabled (`GIT_TERMINAL_PROMPT=0`)

mod git_helper;
pub mod mock;
mod traits;

pub use git_helper::GitCredentialHelper;
pub use traits::{decode, encode, CredentialError, CredentialHelper, Credentials};

use crate::core::endpoint::BasicAuth;

/// Extract Basic auth from a filled credential mapping.
///
/// Returns `None` if the mapping carries neither a username nor a password.
pub fn basic_auth(credentials: &Credentials) -> Option<BasicAuth> {
    let username = credentials.get("username");
    let password = credentials.get("password");
    if username.is_none() && password.is_none() {
        return None;
    }
    Some(BasicAuth {
        username: username.cloned().unwrap_or_default(),
        password: password.cloned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_from_filled_mapping() {
        let creds = decode("protocol=https\nhost=h\nusername=alice\npassword=pw\n");
        let auth = basic_auth(&creds).unwrap();
        assert_eq!(auth.username, "alice");
        assert_eq!(auth.password.as_deref(), Some("pw"));
    }

    #[test]
    fn basic_auth_requires_username_or_password() {
        let creds = decode("protocol=https\nhost=h\n");
        assert!(basic_auth(&creds).is_none());
        assert!(basic_auth(&Credentials::new()).is_none());
    }
}

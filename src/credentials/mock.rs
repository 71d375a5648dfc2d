//! credentials::mock
//!
//! Mock credential helper for deterministic testing.
//!
//! Answers `fill` from a preset mapping and records every call so tests can
//! check how often credentials were requested, approved or rejected.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{CredentialError, CredentialHelper, Credentials};

/// Recorded helper call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialCall {
    Fill(Credentials),
    Approve(Credentials),
    Reject(Credentials),
}

/// Mock credential helper.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockCredentialHelper {
    inner: Arc<Mutex<MockHelperInner>>,
}

#[derive(Debug, Default)]
struct MockHelperInner {
    answer: Credentials,
    fail: bool,
    calls: Vec<CredentialCall>,
}

impl MockCredentialHelper {
    /// A helper that knows no credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// A helper answering `fill` with the given username and password.
    pub fn answering(username: &str, password: &str) -> Self {
        let helper = Self::new();
        {
            let mut inner = helper.lock();
            inner.answer.insert("username".into(), username.into());
            inner.answer.insert("password".into(), password.into());
        }
        helper
    }

    /// A helper whose every call fails as if `git` could not be run.
    pub fn failing() -> Self {
        let helper = Self::new();
        helper.lock().fail = true;
        helper
    }

    /// All calls made so far.
    pub fn calls(&self) -> Vec<CredentialCall> {
        self.lock().calls.clone()
    }

    /// Number of `fill` calls made so far.
    pub fn fill_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, CredentialCall::Fill(_)))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockHelperInner> {
        self.inner.lock().expect("mock helper lock poisoned")
    }

    fn record(&self, call: CredentialCall, subcommand: &'static str) -> Result<(), CredentialError> {
        let mut inner = self.lock();
        inner.calls.push(call);
        if inner.fail {
            return Err(CredentialError::Spawn {
                subcommand,
                message: "mock failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialHelper for MockCredentialHelper {
    async fn fill(&self, input: &Credentials) -> Result<Credentials, CredentialError> {
        self.record(CredentialCall::Fill(input.clone()), "fill")?;
        let inner = self.lock();
        if inner.answer.is_empty() {
            return Ok(Credentials::new());
        }
        let mut filled = input.clone();
        filled.extend(inner.answer.clone());
        Ok(filled)
    }

    async fn approve(&self, credentials: &Credentials) -> Result<(), CredentialError> {
        self.record(CredentialCall::Approve(credentials.clone()), "approve")
    }

    async fn reject(&self, credentials: &Credentials) -> Result<(), CredentialError> {
        self.record(CredentialCall::Reject(credentials.clone()), "reject")
    }
}

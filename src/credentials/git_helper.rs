//! credentials::git_helper
//!
//! Credential helper backed by `git credential`.
//!
//! # Design
//!
//! Each operation runs `git credential <fill|approve|reject>`, writes the
//! input mapping to its stdin and parses its stdout. `GIT_TERMINAL_PROMPT=0`
//! keeps git from prompting on the terminal: stdin/stdout of the agent
//! belong to git-lfs. The helper's stderr is passed through.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::traits::{decode, encode, CredentialError, CredentialHelper, Credentials};

/// Exit status of `git credential fill` when no credentials are available.
const NO_CREDENTIALS_STATUS: i32 = 128;

/// Credential helper shelling out to `git credential`.
#[derive(Debug, Clone)]
pub struct GitCredentialHelper {
    program: PathBuf,
}

impl Default for GitCredentialHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCredentialHelper {
    /// Use the `git` found on `PATH`.
    pub fn new() -> Self {
        Self::with_program("git")
    }

    /// Use a specific executable in place of `git`.
    ///
    /// It is invoked as `<program> credential <subcommand>`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn exec(
        &self,
        subcommand: &'static str,
        input: &Credentials,
    ) -> Result<Credentials, CredentialError> {
        let io_error = |e: std::io::Error| CredentialError::Io {
            subcommand,
            message: e.to_string(),
        };

        let mut child = Command::new(&self.program)
            .arg("credential")
            .arg(subcommand)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CredentialError::Spawn {
                subcommand,
                message: e.to_string(),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A helper may exit without reading its input.
            match stdin.write_all(encode(input).as_bytes()).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(io_error(e)),
            }
        }

        let output = child.wait_with_output().await.map_err(io_error)?;

        if !output.status.success() {
            if subcommand == "fill" && output.status.code() == Some(NO_CREDENTIALS_STATUS) {
                tracing::debug!("credential helper has no credentials");
                return Ok(Credentials::new());
            }
            return Err(CredentialError::Failed {
                subcommand,
                status: output.status.to_string(),
            });
        }

        Ok(decode(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[async_trait]
impl CredentialHelper for GitCredentialHelper {
    async fn fill(&self, input: &Credentials) -> Result<Credentials, CredentialError> {
        self.exec("fill", input).await
    }

    async fn approve(&self, credentials: &Credentials) -> Result<(), CredentialError> {
        self.exec("approve", credentials).await.map(|_| ())
    }

    async fn reject(&self, credentials: &Credentials) -> Result<(), CredentialError> {
        self.exec("reject", credentials).await.map(|_| ())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// Write an executable shell script standing in for `git`.
    fn fake_git(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("fake-git");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn query() -> Credentials {
        let mut creds = Credentials::new();
        creds.insert("url".into(), "https://dav.example.com/lfs".into());
        creds
    }

    #[tokio::test]
    async fn fill_parses_helper_output() {
        let dir = TempDir::new().unwrap();
        let script = fake_git(
            &dir,
            "cat >/dev/null\nprintf 'protocol=https\\nhost=dav.example.com\\nusername=alice\\npassword=s3cret\\n'",
        );
        let helper = GitCredentialHelper::with_program(script);

        let creds = helper.fill(&query()).await.unwrap();
        assert_eq!(creds["username"], "alice");
        assert_eq!(creds["password"], "s3cret");
        assert_eq!(creds["host"], "dav.example.com");
    }

    #[tokio::test]
    async fn helper_receives_input_and_arguments() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("stdin.log");
        let script = fake_git(
            &dir,
            &format!(
                "echo \"args=$1 $2\" > {log}\necho \"prompt=$GIT_TERMINAL_PROMPT\" >> {log}\ncat >> {log}",
                log = log.display()
            ),
        );
        let helper = GitCredentialHelper::with_program(script);

        helper.approve(&query()).await.unwrap();

        let seen = std::fs::read_to_string(&log).unwrap();
        assert!(seen.contains("args=credential approve"));
        assert!(seen.contains("prompt=0"));
        assert!(seen.contains("url=https://dav.example.com/lfs"));
    }

    #[tokio::test]
    async fn fill_status_128_means_no_credentials() {
        let dir = TempDir::new().unwrap();
        let script = fake_git(&dir, "exit 128");
        let helper = GitCredentialHelper::with_program(script);

        let creds = helper.fill(&query()).await.unwrap();
        assert!(creds.is_empty());
    }

    #[tokio::test]
    async fn approve_status_128_is_an_error() {
        let dir = TempDir::new().unwrap();
        let script = fake_git(&dir, "exit 128");
        let helper = GitCredentialHelper::with_program(script);

        let err = helper.approve(&query()).await.unwrap_err();
        assert!(matches!(err, CredentialError::Failed { subcommand: "approve", .. }));
    }

    #[tokio::test]
    async fn other_failures_are_errors() {
        let dir = TempDir::new().unwrap();
        let script = fake_git(&dir, "exit 1");
        let helper = GitCredentialHelper::with_program(script);

        assert!(helper.fill(&query()).await.is_err());
        assert!(helper.reject(&query()).await.is_err());
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let helper = GitCredentialHelper::with_program("/nonexistent/git-for-tests");
        let err = helper.fill(&query()).await.unwrap_err();
        assert!(matches!(err, CredentialError::Spawn { .. }));
    }
}

//! transfer::session
//!
//! State established by a successful `init`, and the per-object transfer
//! steps that run against it.
//!
//! # Authentication
//!
//! The session starts with the credentials embedded in `lfs.url`, if any.
//! When a remote call is rejected as unauthorized and the session has no
//! credentials yet, the git credential helper is asked once, the client is
//! rebuilt with the answer and the call is retried exactly once. A retry
//! the server authorizes approves the credentials, even if the call itself
//! fails for another reason; a retry rejected again rejects them. Helper
//! failures are logged and treated as "no answer".

use std::future::Future;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use url::Url;

use super::errors::ProcessError;
use super::progress::{self, relay};
use super::protocol::{codes, write_message, Response, TransferError};
use crate::core::endpoint::{self, BasicAuth, Endpoint};
use crate::core::types::{staging_dir, ObjectId};
use crate::credentials::{self, CredentialHelper, Credentials};
use crate::git::{ConfigScope, GitError, Repo, LFS_URL_KEY};
use crate::webdav::{RemoteEntry, RemoteStore, StoreConnector, StoreError};

/// Outcome of a failed transfer step.
enum StepError {
    /// Reported to git-lfs; the session continues
    Object(TransferError),
    /// Ends the session
    Fatal(ProcessError),
}

impl From<ProcessError> for StepError {
    fn from(err: ProcessError) -> Self {
        StepError::Fatal(err)
    }
}

impl From<std::io::Error> for StepError {
    fn from(err: std::io::Error) -> Self {
        StepError::Fatal(ProcessError::Io(err))
    }
}

fn object_error(code: i32, message: impl Into<String>) -> StepError {
    StepError::Object(TransferError::new(code, message))
}

/// An initialized transfer session.
pub struct Session {
    git_dir: PathBuf,
    base_url: Url,
    auth: Option<BasicAuth>,
    /// Helper answer awaiting approve/reject
    pending: Option<Credentials>,
    store: Arc<dyn RemoteStore>,
    connector: Arc<dyn StoreConnector>,
    helper: Arc<dyn CredentialHelper>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("git_dir", &self.git_dir)
            .field("base_url", &self.base_url.as_str())
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Resolve the repository and endpoint, and create the remote client.
    pub fn init(
        repo: &dyn Repo,
        connector: Arc<dyn StoreConnector>,
        helper: Arc<dyn CredentialHelper>,
    ) -> Result<Self, TransferError> {
        let git_dir = repo.git_dir().map_err(|e| {
            TransferError::new(codes::GIT_DIR, format!("Failed to get '.git' path: {}", e))
        })?;

        let raw = resolve_url(repo)?;
        let endpoint = Endpoint::parse(&raw).map_err(|e| {
            TransferError::new(codes::URL_UNPARSABLE, format!("Failed to parse LFS URL: {}", e))
        })?;

        let store = connector
            .connect(&endpoint.url, endpoint.auth.as_ref())
            .map_err(|e| {
                TransferError::new(codes::CLIENT, format!("Failed to create WebDAV client: {}", e))
            })?;

        tracing::debug!(
            url = %endpoint.url,
            git_dir = %git_dir.display(),
            authenticated = endpoint.auth.is_some(),
            "transfer session initialized"
        );

        Ok(Self {
            git_dir,
            base_url: endpoint.url,
            auth: endpoint.auth,
            pending: None,
            store,
            connector,
            helper,
        })
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether the session currently holds credentials.
    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    /// Download one object into the staging area and report the outcome.
    pub async fn download<W>(&mut self, oid: &str, size: u64, out: &mut W) -> Result<(), ProcessError>
    where
        W: AsyncWrite + Unpin,
    {
        let result = self.try_download(oid, size, out).await;
        respond(oid, result.map(|path| Response::downloaded(oid, path)), out).await
    }

    /// Upload one object unless the remote already has it, and report the
    /// outcome.
    pub async fn upload<W>(
        &mut self,
        oid: &str,
        size: u64,
        path: &Path,
        out: &mut W,
    ) -> Result<(), ProcessError>
    where
        W: AsyncWrite + Unpin,
    {
        let result = self.try_upload(oid, size, path, out).await;
        respond(oid, result.map(|()| Response::complete(oid)), out).await
    }

    async fn try_download<W>(&mut self, oid: &str, size: u64, out: &mut W) -> Result<PathBuf, StepError>
    where
        W: AsyncWrite + Unpin,
    {
        let oid = ObjectId::new(oid).map_err(|e| object_error(codes::INVALID_OID, e.to_string()))?;
        let remote_path = oid.remote_path();
        let path_ref = remote_path.as_str();

        let entry = self
            .with_auth_retry(move |store| async move { store.stat(path_ref).await })
            .await
            .map_err(|e| {
                object_error(
                    codes::REMOTE_STAT,
                    format!("Failed to stat remote file {:?}: {}", remote_path, e),
                )
            })?;
        if !entry.is_file() {
            return Err(object_error(
                codes::REMOTE_NOT_FILE,
                format!("Remote path {:?} is not a regular file", remote_path),
            ));
        }
        if entry.size != size {
            return Err(object_error(
                codes::REMOTE_SIZE,
                format!(
                    "Expected size {} but remote file {:?} has {}",
                    size, remote_path, entry.size
                ),
            ));
        }

        let reader = self
            .with_auth_retry(move |store| async move { store.read_stream(path_ref).await })
            .await
            .map_err(|e| {
                object_error(
                    codes::REMOTE_READ,
                    format!("Failed to open remote file {:?}: {}", remote_path, e),
                )
            })?;

        let staging = oid.staging_path(&self.git_dir);
        let mut file = create_staging_file(&self.git_dir, &staging).await.map_err(|e| {
            object_error(
                codes::LOCAL_CREATE,
                format!("Failed to create local file {:?}: {}", staging, e),
            )
        })?;

        let (sink, rx) = progress::channel();
        let copy = async move {
            let mut reader = sink.reader(reader);
            let copied = tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
            Ok::<u64, std::io::Error>(copied)
        };

        let copied = relay(oid.as_str(), copy, rx, out).await?;
        let failure = match copied {
            Ok(n) if n == size => None,
            Ok(n) => Some(format!("remote sent {} bytes, expected {}", n, size)),
            Err(e) => Some(e.to_string()),
        };
        if let Some(reason) = failure {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(object_error(
                codes::DOWNLOAD_COPY,
                format!(
                    "Failed to download remote file {:?} to local file {:?}: {}",
                    remote_path, staging, reason
                ),
            ));
        }

        Ok(staging)
    }

    async fn try_upload<W>(&mut self, oid: &str, size: u64, path: &Path, out: &mut W) -> Result<(), StepError>
    where
        W: AsyncWrite + Unpin,
    {
        let oid = ObjectId::new(oid).map_err(|e| object_error(codes::INVALID_OID, e.to_string()))?;

        let meta = tokio::fs::metadata(path).await.map_err(|e| {
            object_error(
                codes::LOCAL_STAT,
                format!("Failed to stat local file {:?}: {}", path, e),
            )
        })?;
        if !meta.is_file() {
            return Err(object_error(
                codes::LOCAL_NOT_FILE,
                format!("Local path {:?} is not a regular file", path),
            ));
        }
        if meta.len() != size {
            return Err(object_error(
                codes::LOCAL_SIZE,
                format!(
                    "Expected size {} but local file {:?} has {}",
                    size,
                    path,
                    meta.len()
                ),
            ));
        }

        let remote_dir = oid.remote_dir();
        let remote_path = oid.remote_path();
        let path_ref = remote_path.as_str();

        let existing: Option<RemoteEntry> = match self
            .with_auth_retry(move |store| async move { store.stat(path_ref).await })
            .await
        {
            Ok(entry) => Some(entry),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                return Err(object_error(
                    codes::UPLOAD_STAT,
                    format!("Failed to stat remote file {:?}: {}", remote_path, e),
                ))
            }
        };
        if let Some(entry) = existing {
            if entry.is_file() && entry.size == size {
                tracing::debug!(oid = oid.as_str(), "remote already has object, skipping upload");
                write_message(out, &Response::progress(oid.as_str(), size, size)).await?;
                return Ok(());
            }
        }

        let dir_ref = remote_dir.as_str();
        self.with_auth_retry(move |store| async move { store.mkdir_all(dir_ref).await })
            .await
            .map_err(|e| {
                object_error(
                    codes::REMOTE_MKDIR,
                    format!("Failed to create remote directory {:?}: {}", remote_dir, e),
                )
            })?;

        let file = tokio::fs::File::open(path).await.map_err(|e| {
            object_error(
                codes::LOCAL_OPEN,
                format!("Failed to open local file {:?}: {}", path, e),
            )
        })?;

        let (sink, rx) = progress::channel();
        let file_ref = &file;
        let sink_ref = &sink;
        let write = self.with_auth_retry(move |store| async move {
            // Each attempt streams the whole file from the start
            let mut handle = file_ref
                .try_clone()
                .await
                .map_err(|e| StoreError::Io(e.to_string()))?;
            handle
                .seek(SeekFrom::Start(0))
                .await
                .map_err(|e| StoreError::Io(e.to_string()))?;
            let body = sink_ref.reader(handle);
            store.write_stream(path_ref, Box::new(body), size).await
        });

        let written = relay(oid.as_str(), write, rx, out).await?;
        written.map_err(|e| {
            object_error(
                codes::REMOTE_WRITE,
                format!(
                    "Failed to upload local file {:?} to remote file {:?}: {}",
                    path, remote_path, e
                ),
            )
        })
    }

    /// Run `op` against the current client, retrying once with helper
    /// credentials if it is rejected as unauthorized.
    async fn with_auth_retry<T, F, Fut>(&mut self, mut op: F) -> Result<T, StoreError>
    where
        F: FnMut(Arc<dyn RemoteStore>) -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let err = match op(Arc::clone(&self.store)).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !err.is_unauthorized() || !self.acquire_credentials().await {
            return Err(err);
        }

        let retried = op(Arc::clone(&self.store)).await;
        let accepted = !matches!(&retried, Err(e) if e.is_unauthorized());
        self.settle_credentials(accepted).await;
        retried
    }

    /// Ask the helper for credentials and rebuild the client with them.
    ///
    /// Returns false if the session already had credentials or none were
    /// obtained.
    async fn acquire_credentials(&mut self) -> bool {
        if self.auth.is_some() {
            return false;
        }

        let mut query = Credentials::new();
        query.insert("url".into(), self.base_url.to_string());
        let filled = match self.helper.fill(&query).await {
            Ok(filled) => filled,
            Err(e) => {
                tracing::warn!("credential helper failed: {}", e);
                return false;
            }
        };
        let Some(auth) = credentials::basic_auth(&filled) else {
            tracing::debug!(url = %self.base_url, "credential helper returned no credentials");
            return false;
        };

        match self.connector.connect(&self.base_url, Some(&auth)) {
            Ok(store) => {
                tracing::debug!(username = %auth.username, "retrying with helper credentials");
                self.store = store;
                self.auth = Some(auth);
                self.pending = Some(filled);
                true
            }
            Err(e) => {
                tracing::warn!(
                    "failed to recreate client for {}: {}",
                    endpoint::redact(self.base_url.as_str()),
                    e
                );
                false
            }
        }
    }

    async fn settle_credentials(&mut self, accepted: bool) {
        let Some(filled) = self.pending.take() else {
            return;
        };
        let result = if accepted {
            self.helper.approve(&filled).await
        } else {
            self.helper.reject(&filled).await
        };
        if let Err(e) = result {
            tracing::warn!("credential helper failed: {}", e);
        }
    }
}

/// Write the final response of a transfer step.
async fn respond<W>(oid: &str, result: Result<Response, StepError>, out: &mut W) -> Result<(), ProcessError>
where
    W: AsyncWrite + Unpin,
{
    let response = match result {
        Ok(response) => response,
        Err(StepError::Object(err)) => {
            tracing::debug!(oid, error = %err, "transfer failed");
            Response::failed(oid, err)
        }
        Err(StepError::Fatal(err)) => return Err(err),
    };
    write_message(out, &response).await?;
    Ok(())
}

/// Read `lfs.url` from the repository config, then from `.lfsconfig`.
fn resolve_url(repo: &dyn Repo) -> Result<String, TransferError> {
    let local = repo.config_get(&ConfigScope::Repository, LFS_URL_KEY);
    if let Some(url) = non_empty(&local) {
        return Ok(url);
    }
    let shared = repo.config_get(&ConfigScope::lfs_config(), LFS_URL_KEY);
    if let Some(url) = non_empty(&shared) {
        return Ok(url);
    }

    let errors: Vec<String> = [&local, &shared]
        .into_iter()
        .filter_map(|r| r.as_ref().err().map(GitError::to_string))
        .collect();
    if !errors.is_empty() {
        return Err(TransferError::new(
            codes::CONFIG_LOOKUP,
            format!("Failed to get LFS URL: {}", errors.join("; ")),
        ));
    }
    Err(TransferError::new(
        codes::URL_NOT_CONFIGURED,
        "Git LFS URL not configured!",
    ))
}

fn non_empty(value: &Result<Option<String>, GitError>) -> Option<String> {
    match value {
        Ok(Some(url)) if !url.is_empty() => Some(url.clone()),
        _ => None,
    }
}

async fn create_staging_file(git_dir: &Path, staging: &Path) -> std::io::Result<tokio::fs::File> {
    tokio::fs::create_dir_all(staging_dir(git_dir)).await?;
    tokio::fs::File::create(staging).await
}

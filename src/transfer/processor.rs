//! transfer::processor
//!
//! The request loop of the custom transfer agent.
//!
//! Requests are handled strictly one at a time, in arrival order. `init`
//! always gets an [`InitResponse`]; a failed init is reported and the loop
//! keeps reading, so git-lfs decides whether to give up. `terminate` ends
//! the loop without a reply, as does end of input.

use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite};

use super::errors::ProcessError;
use super::protocol::{codes, decode_request, write_message, InitResponse, Request, Response, TransferError};
use super::session::Session;
use crate::credentials::CredentialHelper;
use crate::git::Repo;
use crate::webdav::StoreConnector;

/// Custom transfer agent state machine.
pub struct Processor {
    repo: Box<dyn Repo>,
    connector: Arc<dyn StoreConnector>,
    helper: Arc<dyn CredentialHelper>,
    session: Option<Session>,
}

impl Processor {
    pub fn new(
        repo: Box<dyn Repo>,
        connector: Arc<dyn StoreConnector>,
        helper: Arc<dyn CredentialHelper>,
    ) -> Self {
        Self {
            repo,
            connector,
            helper,
            session: None,
        }
    }

    /// The session established by the last successful `init`.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Serve requests from `input` until `terminate` or end of input.
    ///
    /// # Errors
    ///
    /// Malformed request lines and I/O failures on either stream end the
    /// loop with an error. Per-object failures do not.
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<(), ProcessError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            match decode_request(&line)? {
                Request::Init {
                    operation, remote, ..
                } => {
                    tracing::debug!(?operation, remote = %remote, "init");
                    self.init(out).await?;
                }
                Request::Download { oid, size, .. } => {
                    tracing::debug!(oid = %oid, size, "download");
                    match self.session.as_mut() {
                        Some(session) => session.download(&oid, size, out).await?,
                        None => not_initialized(&oid, out).await?,
                    }
                }
                Request::Upload { oid, size, path, .. } => {
                    tracing::debug!(oid = %oid, size, path = %path.display(), "upload");
                    match self.session.as_mut() {
                        Some(session) => session.upload(&oid, size, Path::new(&path), out).await?,
                        None => not_initialized(&oid, out).await?,
                    }
                }
                Request::Terminate => {
                    tracing::debug!("terminate");
                    return Ok(());
                }
                Request::Unknown => {
                    tracing::debug!(line = %line, "ignoring unknown event");
                }
            }
        }
        tracing::debug!("input closed without terminate");
        Ok(())
    }

    async fn init<W>(&mut self, out: &mut W) -> Result<(), ProcessError>
    where
        W: AsyncWrite + Unpin,
    {
        let response = match Session::init(
            self.repo.as_ref(),
            Arc::clone(&self.connector),
            Arc::clone(&self.helper),
        ) {
            Ok(session) => {
                self.session = Some(session);
                InitResponse::ok()
            }
            Err(err) => {
                tracing::warn!(error = %err, "init failed");
                self.session = None;
                InitResponse::failed(err)
            }
        };
        write_message(out, &response).await?;
        Ok(())
    }
}

async fn not_initialized<W>(oid: &str, out: &mut W) -> Result<(), ProcessError>
where
    W: AsyncWrite + Unpin,
{
    let err = TransferError::new(codes::NOT_INITIALIZED, "Transfer requested before init");
    write_message(out, &Response::failed(oid, err)).await?;
    Ok(())
}

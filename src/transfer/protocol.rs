//! transfer::protocol
//!
//! Wire types and codec for the git-lfs custom transfer protocol.
//!
//! # Framing
//!
//! One JSON object per line in both directions. Every response line ends
//! with `\n` and the output is flushed after each line, because git-lfs
//! waits for a reply before sending the next request.
//!
//! # Example
//!
//! ```
//! use git_lfs_webdav::transfer::protocol::{decode_request, Request, Response};
//!
//! let request = decode_request(r#"{"event":"download","oid":"abcd1234","size":10}"#).unwrap();
//! assert!(matches!(request, Request::Download { size: 10, .. }));
//!
//! let line = serde_json::to_string(&Response::complete("abcd1234")).unwrap();
//! assert_eq!(line, r#"{"event":"complete","oid":"abcd1234"}"#);
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Error codes reported in [`TransferError::code`].
///
/// These are local to this agent and identify the failing step.
pub mod codes {
    /// The `.git` directory could not be determined.
    pub const GIT_DIR: i32 = 1;
    /// Reading `lfs.url` from a config store failed.
    pub const CONFIG_LOOKUP: i32 = 2;
    /// No `lfs.url` in the repository config or `.lfsconfig`.
    pub const URL_NOT_CONFIGURED: i32 = 3;
    /// `lfs.url` is not a valid URL.
    pub const URL_UNPARSABLE: i32 = 4;
    /// Download: remote stat failed.
    pub const REMOTE_STAT: i32 = 5;
    /// Download: remote entry is not a regular file.
    pub const REMOTE_NOT_FILE: i32 = 6;
    /// Download: remote size differs from the declared size.
    pub const REMOTE_SIZE: i32 = 7;
    /// Download: opening the remote file failed.
    pub const REMOTE_READ: i32 = 8;
    /// Download: creating the local staging file failed.
    pub const LOCAL_CREATE: i32 = 9;
    /// Download: copying remote content to the staging file failed.
    pub const DOWNLOAD_COPY: i32 = 10;
    /// Upload: local stat failed.
    pub const LOCAL_STAT: i32 = 11;
    /// Upload: local path is not a regular file.
    pub const LOCAL_NOT_FILE: i32 = 12;
    /// Upload: local size differs from the declared size.
    pub const LOCAL_SIZE: i32 = 13;
    /// Upload: remote existence check failed (other than not-found).
    pub const UPLOAD_STAT: i32 = 14;
    /// Upload: creating the remote directories failed.
    pub const REMOTE_MKDIR: i32 = 15;
    /// Upload: opening the local file failed.
    pub const LOCAL_OPEN: i32 = 16;
    /// Upload: writing the remote file failed.
    pub const REMOTE_WRITE: i32 = 17;
    /// The object id cannot be mapped to a remote path.
    pub const INVALID_OID: i32 = 18;
    /// Transfer requested before a successful `init`.
    pub const NOT_INITIALIZED: i32 = 19;
    /// The remote client could not be created.
    pub const CLIENT: i32 = 20;
}

/// Transfer direction announced by `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Upload,
    Download,
}

/// Remote location hint sent by git-lfs.
///
/// Accepted but unused: the remote path is derived from the object id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub href: String,
    #[serde(default, alias = "headers")]
    pub header: Option<HashMap<String, String>>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// A request from git-lfs.
///
/// Unknown event kinds decode to [`Request::Unknown`] and are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum Request {
    Init {
        #[serde(default)]
        operation: Option<Operation>,
        #[serde(default)]
        remote: String,
        #[serde(default)]
        concurrent: bool,
        #[serde(default)]
        concurrenttransfers: u32,
    },
    Upload {
        oid: String,
        size: u64,
        #[serde(default)]
        path: PathBuf,
        #[serde(default)]
        action: Option<Action>,
    },
    Download {
        oid: String,
        size: u64,
        #[serde(default)]
        action: Option<Action>,
    },
    Terminate,
    #[serde(other)]
    Unknown,
}

/// An object-scoped or init failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferError {
    pub code: i32,
    pub message: String,
}

impl TransferError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Reply to `init`. No error means the agent is ready.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InitResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TransferError>,
}

impl InitResponse {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failed(error: TransferError) -> Self {
        Self { error: Some(error) }
    }
}

/// Reply to `upload`/`download`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum Response {
    Complete {
        oid: String,
        /// Staged file of a download; never set for uploads
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<TransferError>,
    },
    #[serde(rename_all = "camelCase")]
    Progress {
        oid: String,
        bytes_so_far: u64,
        bytes_since_last: u64,
    },
}

impl Response {
    /// Successful upload.
    pub fn complete(oid: impl Into<String>) -> Self {
        Response::Complete {
            oid: oid.into(),
            path: None,
            error: None,
        }
    }

    /// Successful download staged at `path`.
    pub fn downloaded(oid: impl Into<String>, path: PathBuf) -> Self {
        Response::Complete {
            oid: oid.into(),
            path: Some(path),
            error: None,
        }
    }

    /// Failed transfer.
    pub fn failed(oid: impl Into<String>, error: TransferError) -> Self {
        Response::Complete {
            oid: oid.into(),
            path: None,
            error: Some(error),
        }
    }

    pub fn progress(oid: impl Into<String>, bytes_so_far: u64, bytes_since_last: u64) -> Self {
        Response::Progress {
            oid: oid.into(),
            bytes_so_far,
            bytes_since_last,
        }
    }
}

/// Decode one request line.
pub fn decode_request(line: &str) -> Result<Request, serde_json::Error> {
    serde_json::from_str(line)
}

/// Write one message as a JSON line and flush.
pub async fn write_message<W, T>(out: &mut W, message: &T) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_vec(message)?;
    line.push(b'\n');
    out.write_all(&line).await?;
    out.flush().await
}

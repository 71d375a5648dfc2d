//! transfer::errors
//!
//! Errors that end the protocol session.
//!
//! Everything scoped to one object or to `init` is reported to git-lfs as
//! a [`TransferError`](super::protocol::TransferError) instead and never
//! surfaces here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    /// A request line is not valid protocol JSON
    #[error("failed to decode transfer request: {0}")]
    Decode(#[from] serde_json::Error),

    /// Reading requests or writing responses failed
    #[error("transfer protocol I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

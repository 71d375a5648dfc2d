//! transfer
//!
//! The git-lfs custom transfer agent.
//!
//! # Flow
//!
//! git-lfs starts the agent with `transfer`, then writes one JSON request
//! per line on stdin:
//!
//! 1. `init`: resolve `lfs.url` and create the WebDAV client
//! 2. `upload`/`download`: move one object, reporting progress
//! 3. `terminate`: stop
//!
//! Objects live at `<base>/<oid[0:2]>/<oid[2:4]>/<oid>` on the server.
//! Downloads are staged at `<git-dir>/lfs/tmp/<oid>.tmp` for git-lfs to
//! move into place.

mod errors;
mod processor;
mod progress;
pub mod protocol;
mod session;

pub use errors::ProcessError;
pub use processor::Processor;
pub use progress::{Progress, ProgressReader, ProgressSink};
pub use session::Session;

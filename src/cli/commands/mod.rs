//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Async Commands
//!
//! `transfer` is async because it does network I/O. It builds its own
//! tokio runtime and blocks on it, so dispatch stays synchronous.

mod init;
mod login;
mod transfer;
mod version;

pub use init::init;
pub use login::login;
pub use transfer::transfer;
pub use version::version;

use super::{Command, Context};
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init { url } => init::init(ctx, url.as_deref()),
        Command::Login => login::login(ctx),
        Command::Transfer => transfer::transfer(ctx),
        Command::Version => version::version(),
    }
}

//! ui::output
//!
//! Human-readable output of the interactive commands.
//!
//! # Design
//!
//! Standard output belongs to the wire protocol while `transfer` runs, so
//! nothing here may be called from the transfer path. Informational lines
//! respect `--quiet`; errors are always shown on stderr.

use std::fmt::Display;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Errors only
    Quiet,
    Normal,
}

impl Verbosity {
    pub fn from_quiet(quiet: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        }
    }
}

/// Print an informational line (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error line (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

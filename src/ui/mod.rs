//! ui
//!
//! User interaction for the interactive commands (`init`, `login`).
//!
//! # Modules
//!
//! - [`prompts`] - Username and password prompts
//! - [`output`] - Informational and error output

pub mod output;
pub mod prompts;

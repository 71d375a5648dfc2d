//! git-lfs-webdav - A git-lfs custom transfer agent backed by WebDAV
//!
//! git-lfs hands every object transfer to this agent, which stores objects
//! on a plain WebDAV server instead of an LFS API server. No server-side
//! component is needed beyond WebDAV itself.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface (`init`, `login`, `transfer`, `version`)
//! - [`transfer`] - Protocol codec, transfer session and event loop
//! - [`webdav`] - Remote store client over WebDAV
//! - [`credentials`] - Bridge to `git credential`
//! - [`git`] - Single interface for repository config access
//! - [`core`] - Object ids and endpoint URLs
//! - [`ui`] - Prompts and output of the interactive commands
//!
//! # Invariants
//!
//! 1. While `transfer` runs, stdout carries protocol messages only
//! 2. Every `upload`/`download` request gets exactly one `complete` reply
//! 3. An object is stored at `<oid[0:2]>/<oid[2:4]>/<oid>` under the base URL
//! 4. A remote call is retried at most once, and only for missing credentials

pub mod cli;
pub mod core;
pub mod credentials;
pub mod git;
pub mod transfer;
pub mod ui;
pub mod webdav;

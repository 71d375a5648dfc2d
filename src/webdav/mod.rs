//! webdav
//!
//! Remote object store over WebDAV.
//!
//! # Architecture
//!
//! The transfer session only sees the [`RemoteStore`] trait:
//!
//! - [`WebDavClient`]: reqwest-based client (`PROPFIND`, `GET`, `PUT`, `MKCOL`)
//! - [`mock::MockStore`]: in-memory store for tests
//!
//! Clients are created through a [`StoreConnector`] so the session can
//! rebuild its client when credentials change.
//!
//! # Example
//!
//! ```ignore
//! use git_lfs_webdav::webdav::{StoreConnector, WebDavConnector};
//!
//! let base = url::Url::parse("https://dav.example.com/lfs")?;
//! let store = WebDavConnector.connect(&base, None)?;
//! let entry = store.stat("ab/cd/abcd1234").await?;
//! ```

mod client;
pub mod mock;
mod propfind;
mod traits;

pub use client::{WebDavClient, WebDavConnector};
pub use traits::{BoxReader, RemoteEntry, RemoteStore, StoreConnector, StoreError};

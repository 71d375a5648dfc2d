//! core
//!
//! Core domain types for the transfer agent.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ObjectId
//! - [`endpoint`] - LFS endpoint URL parsing, scheme masking, embedded credentials
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Remote paths are derived from validated ids only

pub mod endpoint;
pub mod types;

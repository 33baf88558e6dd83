//! # cumulus-client
//!
//! Typed API client for the Cumulus hosting platform.
//!
//! ## Design Principles
//!
//! - The API is project-scoped: every resource lives under
//!   `/v1/projects/{project}`
//! - State-changing environment operations are asynchronous and return an
//!   [`Activity`] handle; callers poll [`ApiClient::activity`] until the
//!   activity reaches a terminal state
//! - Models are read-only snapshots; the client never mutates them locally
//! - Remote rejections surface as [`ApiError::Remote`] with the server's
//!   error code and message preserved

mod client;
mod error;
mod types;

pub use client::ApiClient;
pub use error::ApiError;
pub use types::*;

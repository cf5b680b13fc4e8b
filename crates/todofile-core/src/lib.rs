//! # todofile-core
//!
//! Core types for the todofile task-list service.
//!
//! A todofile deployment is one process owning one task collection, persisted
//! as flat JSON documents. This crate holds the shared vocabulary:
//!
//! - Task records and their patch/import/export shapes
//! - The unified error taxonomy (validation, not-found, auth, storage)
//! - Environment-driven server configuration

mod config;
mod error;
mod types;

pub use config::ServerConfig;
pub use error::{AuthError, Result, StorageError, TodoError};
pub use types::*;

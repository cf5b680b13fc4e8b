//! # todofile-store
//!
//! Persistence layer and task store for the todofile service.
//!
//! The store is the single source of truth during process lifetime: an
//! in-memory task collection behind one exclusive lock, flushed to the
//! persistence backend as a full-document rewrite after every mutation.
//! Missing or corrupt documents at startup are replaced with fresh empty
//! ones instead of failing.

mod backend;
mod store;

pub use backend::{FileStorage, MemoryStorage, StorageBackend};
pub use store::TodoStore;

//! Core type definitions for the todofile task service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single to-do item
///
/// Ids are positive, unique, and monotonically assigned by the store;
/// a deleted id is never reissued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    /// Set once at creation, never touched again
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation, including empty patches
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Create a new todo with both timestamps set to now.
    pub fn new(id: u64, title: String, description: String, completed: bool) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            description,
            completed,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial patch: unset fields are no-ops, not clears.
    /// `updated_at` is refreshed even when the patch is empty.
    pub fn apply_patch(&mut self, patch: &TodoPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        self.updated_at = Utc::now();
    }
}

/// Partial update for a todo; `None` fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

/// Persisted settings document: `{"private_mode": bool}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub private_mode: bool,
}

/// Persisted task document: `{"todos": {"<id>": Todo, ...}, "next_id": int}`
///
/// serde_json writes integer map keys as strings, so the on-disk shape keys
/// each record by its decimal id. Invariant: every key equals its record's
/// `id`, and `next_id` is strictly greater than every existing id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoDocument {
    pub todos: BTreeMap<u64, Todo>,
    pub next_id: u64,
}

impl Default for TodoDocument {
    fn default() -> Self {
        Self {
            todos: BTreeMap::new(),
            next_id: 1,
        }
    }
}

/// Read-only snapshot produced by the export operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    pub todos: BTreeMap<u64, Todo>,
    pub next_id: u64,
    /// Wall-clock time of the export call
    pub exported_at: DateTime<Utc>,
    pub count: usize,
}

/// Import request body; both fields are required but validated by the
/// store (missing fields are a 400, not a deserialization failure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportRequest {
    pub todos: Option<BTreeMap<u64, ImportedTodo>>,
    pub next_id: Option<u64>,
}

/// One record inside an import document
///
/// Timestamps are optional; absent ones fall back to the time of import.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportedTodo {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Outcome of an import operation
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ImportSummary {
    pub imported_count: usize,
    pub previous_count: usize,
}

/// New value of the private-mode flag plus a status phrase for clients
#[derive(Debug, Clone, Serialize)]
pub struct PrivateModeStatus {
    pub message: String,
    pub private_mode: bool,
}

impl PrivateModeStatus {
    pub fn new(private_mode: bool) -> Self {
        let message = if private_mode {
            "Private mode enabled".to_string()
        } else {
            "Private mode disabled".to_string()
        };
        Self {
            message,
            private_mode,
        }
    }
}

//! The task store: in-memory collection of todos behind one exclusive lock
//!
//! Every operation, read or write, holds the lock for its full duration
//! including the persistence flush. Two concurrent creates can therefore
//! never be assigned the same id, and a reader never observes a
//! half-applied import.

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use todofile_core::{
    ExportDocument, ImportRequest, ImportSummary, PrivateModeStatus, Result, Settings, Todo,
    TodoDocument, TodoError, TodoPatch,
};

use crate::backend::StorageBackend;

struct StoreState {
    todos: BTreeMap<u64, Todo>,
    next_id: u64,
    private_mode: bool,
}

/// Process-wide task store
///
/// One explicit instance per process, constructed by [`TodoStore::open`].
/// Durability is best-effort: a failed flush is logged and the in-memory
/// state stays authoritative for the rest of the process lifetime.
pub struct TodoStore {
    storage: Arc<dyn StorageBackend>,
    state: Mutex<StoreState>,
}

impl TodoStore {
    /// Load the persisted documents and build the store.
    ///
    /// Missing, corrupt, or unreadable documents are replaced with fresh
    /// empty ones rather than failing startup.
    pub async fn open(storage: Arc<dyn StorageBackend>) -> Self {
        if let Err(e) = storage.ensure_ready().await {
            warn!("storage not ready at startup: {e}");
        }

        let doc = match storage.load_todos().await {
            Ok(doc) => {
                info!("loaded {} todos, next_id={}", doc.todos.len(), doc.next_id);
                doc
            }
            Err(e) => {
                warn!("could not load task document ({e}), starting empty");
                let doc = TodoDocument::default();
                if let Err(e) = storage.save_todos(&doc).await {
                    error!("failed to write fresh task document: {e}");
                }
                doc
            }
        };

        let settings = match storage.load_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("could not load settings document ({e}), using defaults");
                let settings = Settings::default();
                if let Err(e) = storage.save_settings(&settings).await {
                    error!("failed to write fresh settings document: {e}");
                }
                settings
            }
        };

        Self {
            storage,
            state: Mutex::new(StoreState {
                todos: doc.todos,
                next_id: doc.next_id,
                private_mode: settings.private_mode,
            }),
        }
    }

    /// All todos in map iteration order.
    pub async fn list_all(&self) -> Vec<Todo> {
        let state = self.state.lock().await;
        state.todos.values().cloned().collect()
    }

    /// Create a todo. The title must be non-empty.
    pub async fn create(
        &self,
        title: &str,
        description: &str,
        completed: bool,
    ) -> Result<Todo> {
        if title.trim().is_empty() {
            return Err(TodoError::Validation("Title is required".to_string()));
        }

        let mut state = self.state.lock().await;
        let id = state.next_id;
        state.next_id += 1;

        let todo = Todo::new(id, title.to_string(), description.to_string(), completed);
        state.todos.insert(id, todo.clone());
        self.flush_todos(&state).await;
        Ok(todo)
    }

    /// Fetch one todo by id.
    pub async fn get(&self, id: u64) -> Result<Todo> {
        let state = self.state.lock().await;
        state.todos.get(&id).cloned().ok_or(TodoError::NotFound(id))
    }

    /// Apply a partial patch to one todo. Unset fields are untouched;
    /// `updated_at` is refreshed even when the patch is empty.
    pub async fn update(&self, id: u64, patch: &TodoPatch) -> Result<Todo> {
        let mut state = self.state.lock().await;
        let todo = state.todos.get_mut(&id).ok_or(TodoError::NotFound(id))?;
        todo.apply_patch(patch);
        let updated = todo.clone();
        self.flush_todos(&state).await;
        Ok(updated)
    }

    /// Remove one todo. The id is retired and never reissued.
    pub async fn delete(&self, id: u64) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.todos.remove(&id).is_none() {
            return Err(TodoError::NotFound(id));
        }
        self.flush_todos(&state).await;
        Ok(())
    }

    /// Read-only snapshot of the full collection.
    pub async fn export(&self) -> ExportDocument {
        let state = self.state.lock().await;
        ExportDocument {
            todos: state.todos.clone(),
            next_id: state.next_id,
            exported_at: Utc::now(),
            count: state.todos.len(),
        }
    }

    /// Replace the entire collection from an import document.
    ///
    /// Supplied ids and timestamps are preserved; absent timestamps fall
    /// back to the time of import. `next_id` is overwritten wholesale.
    pub async fn import(&self, request: ImportRequest) -> Result<ImportSummary> {
        let (Some(records), Some(next_id)) = (request.todos, request.next_id) else {
            return Err(TodoError::Validation(
                "Import document must include \"todos\" and \"next_id\"".to_string(),
            ));
        };

        let now = Utc::now();
        let todos: BTreeMap<u64, Todo> = records
            .into_iter()
            .map(|(id, record)| {
                let todo = Todo {
                    id,
                    title: record.title,
                    description: record.description,
                    completed: record.completed,
                    created_at: record.created_at.unwrap_or(now),
                    updated_at: record.updated_at.unwrap_or(now),
                };
                (id, todo)
            })
            .collect();

        let mut state = self.state.lock().await;
        let previous_count = state.todos.len();
        let imported_count = todos.len();
        state.todos = todos;
        state.next_id = next_id;
        self.flush_todos(&state).await;

        info!("imported {imported_count} todos (replaced {previous_count})");
        Ok(ImportSummary {
            imported_count,
            previous_count,
        })
    }

    /// Current value of the private-mode flag.
    pub async fn private_mode(&self) -> bool {
        self.state.lock().await.private_mode
    }

    /// Set the private-mode flag and persist the settings document.
    pub async fn set_private_mode(&self, enabled: bool) -> PrivateModeStatus {
        let mut state = self.state.lock().await;
        state.private_mode = enabled;
        let settings = Settings {
            private_mode: enabled,
        };
        if let Err(e) = self.storage.save_settings(&settings).await {
            error!("failed to persist settings: {e}");
        }
        PrivateModeStatus::new(enabled)
    }

    /// Rewrite the full task document. Failure is logged, not propagated;
    /// the in-memory state remains authoritative.
    async fn flush_todos(&self, state: &StoreState) {
        let doc = TodoDocument {
            todos: state.todos.clone(),
            next_id: state.next_id,
        };
        if let Err(e) = self.storage.save_todos(&doc).await {
            error!("failed to persist todos: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FileStorage, MemoryStorage};
    use std::time::Duration;
    use tempfile::tempdir;
    use todofile_core::ImportedTodo;

    async fn memory_store() -> TodoStore {
        TodoStore::open(Arc::new(MemoryStorage::new())).await
    }

    #[tokio::test]
    async fn ids_strictly_increase_and_never_repeat() {
        let store = memory_store().await;

        let a = store.create("a", "", false).await.unwrap();
        let b = store.create("b", "", false).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);

        store.delete(b.id).await.unwrap();
        let c = store.create("c", "", false).await.unwrap();
        assert_eq!(c.id, 3, "deleted ids must not be reissued");

        store.delete(a.id).await.unwrap();
        store.delete(c.id).await.unwrap();
        let d = store.create("d", "", false).await.unwrap();
        assert_eq!(d.id, 4);
    }

    #[tokio::test]
    async fn create_rejects_empty_title() {
        let store = memory_store().await;

        assert!(matches!(
            store.create("", "desc", false).await,
            Err(TodoError::Validation(_))
        ));
        assert!(matches!(
            store.create("   ", "", false).await,
            Err(TodoError::Validation(_))
        ));
        assert!(store.list_all().await.is_empty());
    }

    #[tokio::test]
    async fn create_sets_equal_timestamps_and_defaults() {
        let store = memory_store().await;

        let todo = store.create("buy milk", "", false).await.unwrap();
        assert_eq!(todo.created_at, todo.updated_at);
        assert_eq!(todo.description, "");
        assert!(!todo.completed);
    }

    #[tokio::test]
    async fn empty_patch_refreshes_updated_at_only() {
        let store = memory_store().await;
        let created = store.create("task", "desc", false).await.unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        let updated = store.update(created.id, &TodoPatch::default()).await.unwrap();

        assert_eq!(updated.title, "task");
        assert_eq!(updated.description, "desc");
        assert!(!updated.completed);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
    }

    #[tokio::test]
    async fn update_applies_partial_patch() {
        let store = memory_store().await;
        let created = store.create("task", "desc", false).await.unwrap();

        let patch = TodoPatch {
            completed: Some(true),
            ..Default::default()
        };
        let updated = store.update(created.id, &patch).await.unwrap();
        assert!(updated.completed);
        assert_eq!(updated.title, "task");
        assert_eq!(updated.description, "desc");

        assert!(matches!(
            store.update(999, &TodoPatch::default()).await,
            Err(TodoError::NotFound(999))
        ));
    }

    #[tokio::test]
    async fn delete_then_get_fails_with_not_found() {
        let store = memory_store().await;
        let todo = store.create("ephemeral", "", false).await.unwrap();

        store.delete(todo.id).await.unwrap();
        assert!(matches!(
            store.get(todo.id).await,
            Err(TodoError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(todo.id).await,
            Err(TodoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn export_then_import_reproduces_the_collection() {
        let store = memory_store().await;
        store.create("one", "first", false).await.unwrap();
        store.create("two", "second", true).await.unwrap();
        store.delete(1).await.unwrap();
        store.create("three", "", false).await.unwrap();

        let exported = store.export().await;
        assert_eq!(exported.count, 2);

        // Feed the export straight back through the import wire shape.
        let value = serde_json::to_value(&exported).unwrap();
        let request: ImportRequest = serde_json::from_value(value).unwrap();

        let other = memory_store().await;
        let summary = other.import(request).await.unwrap();
        assert_eq!(summary.imported_count, 2);
        assert_eq!(summary.previous_count, 0);

        assert_eq!(other.list_all().await, store.list_all().await);
        let reexported = other.export().await;
        assert_eq!(reexported.todos, exported.todos);
        assert_eq!(reexported.next_id, exported.next_id);
    }

    #[tokio::test]
    async fn import_requires_both_fields() {
        let store = memory_store().await;

        let missing_next_id = ImportRequest {
            todos: Some(BTreeMap::new()),
            next_id: None,
        };
        assert!(matches!(
            store.import(missing_next_id).await,
            Err(TodoError::Validation(_))
        ));

        let missing_todos = ImportRequest {
            todos: None,
            next_id: Some(5),
        };
        assert!(matches!(
            store.import(missing_todos).await,
            Err(TodoError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn import_replaces_everything_and_defaults_timestamps() {
        let store = memory_store().await;
        store.create("old", "", false).await.unwrap();

        let mut records = BTreeMap::new();
        records.insert(
            10,
            ImportedTodo {
                title: "imported".to_string(),
                description: String::new(),
                completed: true,
                created_at: None,
                updated_at: None,
            },
        );
        let summary = store
            .import(ImportRequest {
                todos: Some(records),
                next_id: Some(11),
            })
            .await
            .unwrap();

        assert_eq!(summary.imported_count, 1);
        assert_eq!(summary.previous_count, 1);

        let todos = store.list_all().await;
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].id, 10);
        assert!(todos[0].completed);

        let next = store.create("after import", "", false).await.unwrap();
        assert_eq!(next.id, 11);
    }

    #[tokio::test]
    async fn private_mode_toggles_and_reports() {
        let store = memory_store().await;
        assert!(!store.private_mode().await);

        let status = store.set_private_mode(true).await;
        assert!(status.private_mode);
        assert_eq!(status.message, "Private mode enabled");
        assert!(store.private_mode().await);

        let status = store.set_private_mode(false).await;
        assert!(!status.private_mode);
        assert_eq!(status.message, "Private mode disabled");
    }

    #[tokio::test]
    async fn state_survives_reopen_from_disk() {
        let dir = tempdir().unwrap();

        {
            let store = TodoStore::open(Arc::new(FileStorage::new(dir.path()))).await;
            store.create("persisted", "across restarts", false).await.unwrap();
            store.set_private_mode(true).await;
        }

        let store = TodoStore::open(Arc::new(FileStorage::new(dir.path()))).await;
        let todos = store.list_all().await;
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "persisted");
        assert!(store.private_mode().await);

        // next_id survived too
        let next = store.create("new", "", false).await.unwrap();
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn corrupt_document_self_heals_to_empty() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("todos.json"), "{definitely not json").unwrap();

        let store = TodoStore::open(Arc::new(FileStorage::new(dir.path()))).await;
        assert!(store.list_all().await.is_empty());

        // A fresh, valid empty document was written in place of the garbage.
        let content = std::fs::read_to_string(dir.path().join("todos.json")).unwrap();
        let doc: TodoDocument = serde_json::from_str(&content).unwrap();
        assert!(doc.todos.is_empty());
        assert_eq!(doc.next_id, 1);

        let first = store.create("fresh start", "", false).await.unwrap();
        assert_eq!(first.id, 1);
    }

    #[tokio::test]
    async fn zero_length_document_self_heals_to_empty() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("todos.json"), "").unwrap();

        let store = TodoStore::open(Arc::new(FileStorage::new(dir.path()))).await;
        assert!(store.list_all().await.is_empty());

        let content = std::fs::read_to_string(dir.path().join("todos.json")).unwrap();
        assert!(serde_json::from_str::<TodoDocument>(&content).is_ok());
    }

    #[tokio::test]
    async fn write_failure_keeps_in_memory_state_authoritative() {
        let storage = Arc::new(MemoryStorage::new());
        let store = TodoStore::open(storage.clone()).await;

        storage.fail_writes(true);
        let todo = store.create("unflushed", "", false).await.unwrap();
        assert_eq!(store.get(todo.id).await.unwrap().title, "unflushed");
        assert_eq!(store.list_all().await.len(), 1);
    }
}

//! Storage backends for the persisted JSON documents
//!
//! Two documents exist: the task collection (`todos.json`) and the settings
//! (`settings.json`). Every write is a full-document rewrite; the expected
//! task count is small, so crash consistency reduces to "last complete
//! write wins".

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use todofile_core::{Settings, StorageError, TodoDocument};

const TODOS_FILE: &str = "todos.json";
const SETTINGS_FILE: &str = "settings.json";

/// Abstraction over the durable document storage
///
/// The seam exists so tests can construct stores against an in-memory
/// backend without touching the filesystem.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Prepare the backing location. Idempotent; called once at startup
    /// and again before writes.
    async fn ensure_ready(&self) -> Result<(), StorageError>;

    /// Read the task document. `NotFound` when absent, `Corrupt` when the
    /// content does not parse as the required structure.
    async fn load_todos(&self) -> Result<TodoDocument, StorageError>;

    /// Overwrite the task document with the full collection.
    async fn save_todos(&self, doc: &TodoDocument) -> Result<(), StorageError>;

    /// Read the settings document.
    async fn load_settings(&self) -> Result<Settings, StorageError>;

    /// Overwrite the settings document.
    async fn save_settings(&self, settings: &Settings) -> Result<(), StorageError>;
}

/// File-backed storage: pretty-printed JSON documents under a data directory
pub struct FileStorage {
    data_dir: PathBuf,
}

impl FileStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn todos_path(&self) -> PathBuf {
        self.data_dir.join(TODOS_FILE)
    }

    fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    async fn read_document<T: serde::de::DeserializeOwned>(
        path: &Path,
    ) -> Result<T, StorageError> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StorageError::NotFound),
            Err(e) => return Err(StorageError::Io(e)),
        };
        Ok(serde_json::from_str(&content)?)
    }

    async fn write_document<T: serde::Serialize>(
        &self,
        path: &Path,
        value: &T,
    ) -> Result<(), StorageError> {
        self.ensure_ready().await?;
        let content = serde_json::to_vec_pretty(value)?;
        fs::write(path, content).await?;
        debug!("wrote {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FileStorage {
    async fn ensure_ready(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.data_dir).await?;
        Ok(())
    }

    async fn load_todos(&self) -> Result<TodoDocument, StorageError> {
        Self::read_document(&self.todos_path()).await
    }

    async fn save_todos(&self, doc: &TodoDocument) -> Result<(), StorageError> {
        self.write_document(&self.todos_path(), doc).await
    }

    async fn load_settings(&self) -> Result<Settings, StorageError> {
        Self::read_document(&self.settings_path()).await
    }

    async fn save_settings(&self, settings: &Settings) -> Result<(), StorageError> {
        self.write_document(&self.settings_path(), settings).await
    }
}

/// In-memory storage backend for tests
///
/// Starts empty (loads report `NotFound`, as an absent file would) and can
/// be switched into a failing mode to exercise the log-and-continue path
/// on write failures.
#[derive(Default)]
pub struct MemoryStorage {
    todos: Mutex<Option<TodoDocument>>,
    settings: Mutex<Option<Settings>>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the backend with a task document.
    pub fn with_document(doc: TodoDocument) -> Self {
        Self {
            todos: Mutex::new(Some(doc)),
            settings: Mutex::new(None),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent write fail with an I/O error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::new(
                ErrorKind::Other,
                "memory storage in failing mode",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn ensure_ready(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn load_todos(&self) -> Result<TodoDocument, StorageError> {
        (*self.todos.lock().await)
            .clone()
            .ok_or(StorageError::NotFound)
    }

    async fn save_todos(&self, doc: &TodoDocument) -> Result<(), StorageError> {
        self.check_writable()?;
        *self.todos.lock().await = Some(doc.clone());
        Ok(())
    }

    async fn load_settings(&self) -> Result<Settings, StorageError> {
        (*self.settings.lock().await).ok_or(StorageError::NotFound)
    }

    async fn save_settings(&self, settings: &Settings) -> Result<(), StorageError> {
        self.check_writable()?;
        *self.settings.lock().await = Some(*settings);
        Ok(())
    }
}

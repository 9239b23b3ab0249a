//! Bounded, ordered clipboard history with pluggable persistence
//!
//! The in-memory sequence is the source of truth; persistence is best-effort.
//! A failed save surfaces as a recoverable error while the in-memory state
//! keeps the mutation, so a crash between mutation and save may lose the most
//! recent change.

use crate::shared::errors::{EngineError, EngineResult};
use crate::shared::types::ClipboardEntry;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Storage collaborator for clipboard history persistence
pub trait Storage: Send + Sync {
    fn load(&self) -> EngineResult<Vec<ClipboardEntry>>;
    fn save(&self, entries: &[ClipboardEntry]) -> EngineResult<()>;
}

/// JSON-file storage, one pretty-printed document holding the whole sequence
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default location under the platform data directory
    pub fn default_path() -> EngineResult<PathBuf> {
        directories::ProjectDirs::from("com", "antigravity", "clipkeep")
            .map(|dirs| dirs.data_dir().join("history.json"))
            .ok_or_else(|| EngineError::SystemIO("Failed to determine data directory".to_string()))
    }
}

impl Storage for JsonFileStorage {
    fn load(&self) -> EngineResult<Vec<ClipboardEntry>> {
        if !self.path.exists() {
            // fresh install
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| EngineError::Persistence(format!("Failed to read history file: {}", e)))?;
        serde_json::from_str(&content)
            .map_err(|e| EngineError::Persistence(format!("Corrupt history file: {}", e)))
    }

    fn save(&self, entries: &[ClipboardEntry]) -> EngineResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| EngineError::Persistence(format!("Failed to create data directory: {}", e)))?;
        }
        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| EngineError::Persistence(format!("Failed to serialize history: {}", e)))?;
        std::fs::write(&self.path, content)
            .map_err(|e| EngineError::Persistence(format!("Failed to write history file: {}", e)))
    }
}

/// In-memory storage, used as a test double and as a fallback when no data
/// directory is available
#[derive(Default)]
pub struct InMemoryStorage {
    entries: Mutex<Vec<ClipboardEntry>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for InMemoryStorage {
    fn load(&self) -> EngineResult<Vec<ClipboardEntry>> {
        let entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(entries.clone())
    }

    fn save(&self, entries: &[ClipboardEntry]) -> EngineResult<()> {
        let mut stored = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *stored = entries.to_vec();
        Ok(())
    }
}

struct HistoryInner {
    entries: Vec<ClipboardEntry>,
    max_history: usize,
}

/// Ordered, bounded history store, newest first
#[derive(Clone)]
pub struct ClipboardHistory {
    inner: Arc<Mutex<HistoryInner>>,
    storage: Arc<dyn Storage>,
}

impl ClipboardHistory {
    /// Create a store, loading any persisted entries.
    ///
    /// A load failure or corrupt data falls back to an empty sequence with a
    /// warning; a fresh install is never a fatal error.
    pub fn new(storage: Arc<dyn Storage>, max_history: usize) -> Self {
        let entries = match storage.load() {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("[ClipboardHistory] Failed to load history, starting empty: {}", e);
                Vec::new()
            }
        };

        Self {
            inner: Arc::new(Mutex::new(HistoryInner { entries, max_history })),
            storage,
        }
    }

    /// Prepend an entry, evicting from the tail past the bound, then persist.
    ///
    /// The in-memory mutation always succeeds; only the save can fail.
    pub fn insert(&self, entry: ClipboardEntry) -> EngineResult<()> {
        let snapshot = {
            let mut inner = self.lock();
            inner.entries.insert(0, entry);
            let bound = inner.max_history;
            inner.entries.truncate(bound);
            inner.entries.clone()
        };
        self.storage.save(&snapshot)
    }

    /// Delete the entry with a matching id; absence is a no-op.
    /// Returns whether an entry was removed.
    pub fn remove(&self, id: &str) -> EngineResult<bool> {
        let (removed, snapshot) = {
            let mut inner = self.lock();
            let before = inner.entries.len();
            inner.entries.retain(|entry| entry.id != id);
            (inner.entries.len() != before, inner.entries.clone())
        };
        if removed {
            self.storage.save(&snapshot)?;
        }
        Ok(removed)
    }

    pub fn clear(&self) -> EngineResult<()> {
        {
            let mut inner = self.lock();
            inner.entries.clear();
        }
        self.storage.save(&[])
    }

    /// Current snapshot of the history, newest first
    pub fn items(&self) -> Vec<ClipboardEntry> {
        self.lock().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Update the bound. Does not retroactively evict; the new bound applies
    /// on the next insert.
    pub fn set_max_history(&self, max_history: usize) {
        self.lock().max_history = max_history;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HistoryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

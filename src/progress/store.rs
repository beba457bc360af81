//! Persistence of the progress snapshot

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::snapshot::ProgressSnapshot;

/// File name of the persisted snapshot inside the data directory
pub const PROGRESS_FILE: &str = "progress.json";

/// Errors from a progress store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("progress storage I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("progress record is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Where a learner's snapshot lives between sessions
///
/// A single record under one fixed key. Callers treat every error as
/// "no progress" and carry on.
pub trait ProgressStore {
    fn save(&self, snapshot: &ProgressSnapshot) -> Result<(), StoreError>;

    /// `Ok(None)` when nothing has been saved
    fn load(&self) -> Result<Option<ProgressSnapshot>, StoreError>;

    fn clear(&self) -> Result<(), StoreError>;
}

/// Stores the snapshot as pretty JSON on disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store `progress.json` inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(PROGRESS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io { path: self.path.clone(), source }
    }
}

impl ProgressStore for JsonFileStore {
    fn save(&self, snapshot: &ProgressSnapshot) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let contents = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&self.path, contents).map_err(|e| self.io_error(e))?;
        tracing::debug!("Saved progress to {:?}", self.path);
        Ok(())
    }

    fn load(&self) -> Result<Option<ProgressSnapshot>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// Keeps the serialized record in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: RefCell<Option<String>>,
    saves: Cell<usize>,
    clears: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a raw record, as if written by an earlier session
    pub fn with_record(record: impl Into<String>) -> Self {
        Self { record: RefCell::new(Some(record.into())), ..Self::default() }
    }

    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    pub fn clear_count(&self) -> usize {
        self.clears.get()
    }

    pub fn is_empty(&self) -> bool {
        self.record.borrow().is_none()
    }
}

impl ProgressStore for MemoryStore {
    fn save(&self, snapshot: &ProgressSnapshot) -> Result<(), StoreError> {
        let json = serde_json::to_string(snapshot)?;
        *self.record.borrow_mut() = Some(json);
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn load(&self) -> Result<Option<ProgressSnapshot>, StoreError> {
        match self.record.borrow().as_deref() {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.record.borrow_mut() = None;
        self.clears.set(self.clears.get() + 1);
        Ok(())
    }
}

impl<T: ProgressStore + ?Sized> ProgressStore for &T {
    fn save(&self, snapshot: &ProgressSnapshot) -> Result<(), StoreError> {
        (**self).save(snapshot)
    }

    fn load(&self) -> Result<Option<ProgressSnapshot>, StoreError> {
        (**self).load()
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

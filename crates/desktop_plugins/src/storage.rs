//! Storage adapters and the clock abstraction backing the persistence
//! plugin's debounced saves.

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use thiserror::Error;

use crate::persistence::PersistedState;

/// Pluggable backing store for persisted desktop state.
///
/// Adapters are best-effort: failures are logged, never propagated, so a full
/// disk or unreadable file degrades persistence without breaking the desktop.
pub trait StorageAdapter {
    /// Loads the persisted document, `None` when absent or unreadable.
    fn load(&self) -> Option<PersistedState>;
    fn save(&self, state: &PersistedState);
    fn clear(&self);
}

#[derive(Debug, Error)]
enum FileStorageError {
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage decode: {0}")]
    Decode(#[from] serde_json::Error),
}

/// JSON-file adapter, the desktop equivalent of browser local storage.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<PersistedState, FileStorageError> {
        let data = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn write(&self, state: &PersistedState) -> Result<(), FileStorageError> {
        let data = serde_json::to_string(state)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

impl StorageAdapter for FileStorage {
    fn load(&self) -> Option<PersistedState> {
        if !self.path.exists() {
            return None;
        }
        match self.read() {
            Ok(state) => Some(state),
            Err(error) => {
                tracing::warn!(path = %self.path.display(), %error, "failed to load desktop state");
                None
            }
        }
    }

    fn save(&self, state: &PersistedState) {
        if let Err(error) = self.write(state) {
            tracing::warn!(path = %self.path.display(), %error, "failed to save desktop state");
        }
    }

    fn clear(&self) {
        if self.path.exists() {
            if let Err(error) = fs::remove_file(&self.path) {
                tracing::warn!(path = %self.path.display(), %error, "failed to clear desktop state");
            }
        }
    }
}

/// In-memory adapter, mainly for tests. Cloning shares the underlying slot.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    data: Rc<RefCell<Option<PersistedState>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Peek at the stored document.
    pub fn data(&self) -> Option<PersistedState> {
        self.data.borrow().clone()
    }
}

impl StorageAdapter for MemoryStorage {
    fn load(&self) -> Option<PersistedState> {
        self.data.borrow().clone()
    }

    fn save(&self, state: &PersistedState) {
        *self.data.borrow_mut() = Some(state.clone());
    }

    fn clear(&self) {
        *self.data.borrow_mut() = None;
    }
}

/// Delegates to several adapters: `load` returns the first hit, `save` and
/// `clear` fan out to all. Useful for layering a fast local store over a
/// slower synced one.
pub struct ChainedStorage {
    adapters: Vec<Box<dyn StorageAdapter>>,
}

impl ChainedStorage {
    pub fn new(adapters: Vec<Box<dyn StorageAdapter>>) -> Self {
        Self { adapters }
    }
}

impl StorageAdapter for ChainedStorage {
    fn load(&self) -> Option<PersistedState> {
        self.adapters.iter().find_map(|adapter| adapter.load())
    }

    fn save(&self, state: &PersistedState) {
        for adapter in &self.adapters {
            adapter.save(state);
        }
    }

    fn clear(&self) {
        for adapter in &self.adapters {
            adapter.clear();
        }
    }
}

/// Monotonic millisecond clock driving save debouncing. Injectable so tests
/// control time.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock anchored at construction.
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Hand-cranked clock for tests.
#[derive(Clone, Default)]
pub struct ManualClock {
    ms: Rc<RefCell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        *self.ms.borrow_mut() += ms;
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        *self.ms.borrow()
    }
}

//! Persisted "last viewed page".
//!
//! A single scoped key holding the page number as a string-encoded integer.
//! The file store keeps it in a small JSON object so other keys can live
//! alongside it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::FolioError;

/// Key under which the last displayed page is stored.
pub const LAST_PAGE_KEY: &str = "lastPage";

/// Write-through storage for the last displayed page.
pub trait PageStore {
    /// The stored page, or `None` when absent or not an integer.
    fn load(&self) -> Option<u32>;

    fn save(&mut self, page: u32) -> Result<(), FolioError>;
}

/// JSON-file store, by default at the platform data dir (see [`AppConfig::state_path`](crate::config::AppConfig::state_path)).
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when there is no file to read.
    fn read_map(&self) -> Result<Option<BTreeMap<String, String>>, serde_json::Error> {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return Ok(None);
        };
        serde_json::from_str(&content).map(Some)
    }
}

impl PageStore for FileStore {
    fn load(&self) -> Option<u32> {
        let map = match self.read_map() {
            Ok(map) => map?,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Ignoring unreadable state file: {e}");
                return None;
            }
        };
        map.get(LAST_PAGE_KEY)?.trim().parse().ok()
    }

    fn save(&mut self, page: u32) -> Result<(), FolioError> {
        let mut map = match self.read_map() {
            Ok(map) => map.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "Overwriting unreadable state file, its other keys are lost: {e}"
                );
                BTreeMap::new()
            }
        };
        map.insert(LAST_PAGE_KEY.to_string(), page.to_string());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json =
            serde_json::to_string_pretty(&map).map_err(|e| FolioError::Persist(e.to_string()))?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

/// In-memory store. Clones share the stored value.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    value: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            value: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    /// The raw stored string.
    pub fn raw(&self) -> Option<String> {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PageStore for MemoryStore {
    fn load(&self) -> Option<u32> {
        self.raw()?.trim().parse().ok()
    }

    fn save(&mut self, page: u32) -> Result<(), FolioError> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(page.to_string());
        Ok(())
    }
}

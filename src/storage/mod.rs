//! Persistence layer.
//!
//! A small key-value port standing in for browser-local storage. Values
//! are JSON text; callers own their own (de)serialization. The binary uses
//! [`JsonFileStore`], tests use [`MemoryStore`].

pub mod cache;
pub mod community;

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::types::BetVisionError;

pub use cache::{CacheEntry, LocalCache};
pub use community::CommunityBoard;

/// Key of the cached fixtures payload.
pub const FIXTURES_CACHE_KEY: &str = "betvision_fixtures_cache";

/// Key of the community tips collection.
pub const COMMUNITY_KEY: &str = "betvision_tips";

/// Durable key-value storage.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`, `None` when absent.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn load(&self, key: &str) -> Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        (**self).save(key, value)
    }
}

fn lock(entries: &Mutex<HashMap<String, String>>) -> Result<MutexGuard<'_, HashMap<String, String>>> {
    entries
        .lock()
        .map_err(|_| BetVisionError::Storage("store lock poisoned".into()).into())
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Volatile store, used by tests and when no path is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.entries)?.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// All keys in a single JSON object on disk, rewritten on every save.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store at `path`.
    ///
    /// A missing file starts empty. A corrupt or unreadable file is logged
    /// and also starts empty; it is overwritten on the next save.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();

        let entries = match std::fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str::<HashMap<String, String>>(&json) {
                Ok(map) => {
                    info!(path = %path.display(), keys = map.len(), "Store loaded from disk");
                    map
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Store file is corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No store file found, starting fresh");
                HashMap::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Store file unreadable, starting empty");
                HashMap::new()
            }
        };

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &HashMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries).context("Failed to serialise store")?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        // Atomic replace
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        debug!(path = %self.path.display(), keys = entries.len(), "Store saved");
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = lock(&self.entries)?;
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        // Memory only changes once the file does.
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

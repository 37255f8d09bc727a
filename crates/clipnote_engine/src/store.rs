use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use clip_logging::clip_warn;
use clipnote_core::Settings;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::types::StoreError;

/// Well-known durable storage keys.
pub mod keys {
    /// Durable mirror of the last completed operation result.
    pub const RESULT_MIRROR: &str = "current_summary";
    /// Staged quick-note attachments.
    pub const ATTACHMENTS: &str = "staged_attachments";
    /// Persisted affordance position.
    pub const BALL_POSITION: &str = "ball_position";
    /// The settings object.
    pub const SETTINGS: &str = "settings";
}

/// Durable key-value storage shared across contexts. Eventually consistent,
/// no transactions: concurrent writers to the same key race, last write wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key).await
    }
}

/// In-memory store for tests and ephemeral setups.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.lock().expect("lock kv entries").get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries
            .lock()
            .expect("lock kv entries")
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().expect("lock kv entries").remove(key);
        Ok(())
    }
}

/// File-backed store: one JSON object per file, rewritten atomically by
/// writing a temp file in the same directory and renaming it over the target.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, Value>>,
}

impl FileStore {
    /// Opens (or initializes) the store at `path`. A missing file starts
    /// empty; an unreadable one is reported.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn write_through(&self, entries: &HashMap<String, Value>) -> Result<(), StoreError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&dir)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(serde_json::to_string_pretty(entries)?.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.lock().expect("lock kv entries").get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let snapshot = {
            let mut entries = self.entries.lock().expect("lock kv entries");
            entries.insert(key.to_string(), value);
            entries.clone()
        };
        self.write_through(&snapshot)
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let snapshot = {
            let mut entries = self.entries.lock().expect("lock kv entries");
            entries.remove(key);
            entries.clone()
        };
        self.write_through(&snapshot)
    }
}

/// The synchronized settings store. Loading always yields a usable,
/// normalized object: absent or partially stored settings are merged with
/// defaults, and the template invariants are repaired.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<Settings, StoreError>;
    async fn save(&self, settings: &Settings) -> Result<(), StoreError>;
    /// Drops the stored object and returns the defaults.
    async fn reset(&self) -> Result<Settings, StoreError>;
}

/// Settings persisted under [`keys::SETTINGS`] of a key-value store.
pub struct KvSettingsStore<S> {
    store: S,
}

impl<S: KeyValueStore> KvSettingsStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: KeyValueStore> SettingsStore for KvSettingsStore<S> {
    async fn load(&self) -> Result<Settings, StoreError> {
        let mut settings = match self.store.get(keys::SETTINGS).await? {
            Some(value) => match serde_json::from_value(value) {
                Ok(settings) => settings,
                Err(err) => {
                    clip_warn!("stored settings unreadable, using defaults: {err}");
                    Settings::default()
                }
            },
            None => Settings::default(),
        };
        settings.normalize();
        Ok(settings)
    }

    async fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        let mut normalized = settings.clone();
        normalized.normalize();
        self.store
            .set(keys::SETTINGS, serde_json::to_value(&normalized)?)
            .await
    }

    async fn reset(&self) -> Result<Settings, StoreError> {
        self.store.remove(keys::SETTINGS).await?;
        Ok(Settings::default())
    }
}

//! Persistent key-value storage for client-side state.
//!
//! The task-history cache never touches the filesystem directly. It goes
//! through the [`KeyValueStore`] trait so it can be exercised in tests with
//! [`MemoryStore`] and backed by [`FileStore`] in the CLI.
//!
//! Storage file: `~/.botdash/storage.json` (a flat JSON object of string
//! keys to string values).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// String-keyed, string-valued storage.
pub trait KeyValueStore {
    /// Return the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Store several keys at once.
    ///
    /// Implementations that persist should make the whole batch visible
    /// together. The default writes the keys one by one.
    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Volatile store, used in tests and when no home directory is available.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// JSON-file-backed store.
///
/// The file is read once on [`open`](Self::open) and rewritten in full on
/// every write. Writes go to a sibling `.tmp` file which is then renamed
/// over the original, so a batch from [`set_many`](KeyValueStore::set_many)
/// lands as a unit.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`.
    ///
    /// A missing or unreadable file yields an empty store; the file is
    /// created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        Self { path, values }
    }

    /// Open the store at the default location, `~/.botdash/storage.json`.
    pub fn open_default() -> Option<Self> {
        default_storage_path().map(Self::open)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(&self.values)
            .context("failed to serialize storage")?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;

        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }

    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.values.insert((*key).to_string(), (*value).to_string());
        }
        self.flush()
    }
}

/// Path to the default storage file.
pub fn default_storage_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".botdash").join("storage.json"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("a"), None);

        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").as_deref(), Some("2"));
    }

    #[test]
    fn memory_store_set_many_writes_every_key() {
        let mut store = MemoryStore::new();
        store.set_many(&[("x", "1"), ("y", "2")]).unwrap();
        assert_eq!(store.get("x").as_deref(), Some("1"));
        assert_eq!(store.get("y").as_deref(), Some("2"));
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut store = FileStore::open(&path);
        store
            .set_many(&[("records", "[]"), ("written_at", "42")])
            .unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("records").as_deref(), Some("[]"));
        assert_eq!(reopened.get("written_at").as_deref(), Some("42"));
    }

    #[test]
    fn file_store_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json at all").unwrap();

        let mut store = FileStore::open(&path);
        assert_eq!(store.get("anything"), None);

        store.set("k", "v").unwrap();
        assert_eq!(FileStore::open(&path).get("k").as_deref(), Some("v"));
    }
}

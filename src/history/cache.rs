use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::store::KeyValueStore;

use super::record::TaskRecord;

/// Storage key holding the JSON array of cached task records.
pub const RECORDS_KEY: &str = "task_history.records";

/// Storage key holding the epoch-millisecond time of the last write.
pub const WRITTEN_AT_KEY: &str = "task_history.written_at";

/// Raw persisted cache entry, exactly as read from storage.
///
/// Nothing is parsed here; interpretation belongs to the refresh policy so
/// that a corrupt entry is just a cache miss.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredPayload {
    pub records: Option<String>,
    pub written_at: Option<String>,
}

/// Task-history cache on top of an injected key-value store.
pub struct CacheStore {
    store: Box<dyn KeyValueStore>,
}

impl CacheStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn read(&self) -> StoredPayload {
        StoredPayload {
            records: self.store.get(RECORDS_KEY),
            written_at: self.store.get(WRITTEN_AT_KEY),
        }
    }

    /// Persist `records` with `now` as the write time. Both keys go out in
    /// one batch.
    pub fn write(&mut self, records: &[TaskRecord], now: DateTime<Utc>) -> Result<()> {
        let json = serde_json::to_string(records).context("failed to serialize task history")?;
        let written_at = now.timestamp_millis().to_string();

        self.store
            .set_many(&[(RECORDS_KEY, json.as_str()), (WRITTEN_AT_KEY, written_at.as_str())])
            .context("failed to persist task history cache")
    }
}

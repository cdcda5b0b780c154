//! Task-history cache and aggregator.
//!
//! [`TaskHistory`] owns the in-memory working set of task records for one
//! dashboard session, the persisted cache behind it and the refresh policy
//! deciding between the two. A refresh cycle is:
//!
//! 1. [`RefreshPolicy::decide`] on the stored entry
//! 2. cached records, or a fetch through a [`TaskSource`]
//! 3. [`merge`] when new records arrive, then a cache write
//! 4. [`aggregate`] for the chart
//!
//! Failures never escape: a bad cache is a miss, a failed fetch leaves an
//! empty working set and a log line.

pub mod aggregate;
pub mod cache;
pub mod merge;
pub mod policy;
pub mod record;

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};

use crate::config::schema::CacheConfig;
use crate::store::{FileStore, KeyValueStore, MemoryStore};

pub use aggregate::{DayBucket, TrendWindow, aggregate};
pub use cache::{CacheStore, StoredPayload};
pub use merge::{MAX_RECORDS, merge, merge_capped, merge_json};
pub use policy::{MissReason, Refresh, RefreshPolicy};
pub use record::{TaskRecord, TaskTimestamp};

/// Anything that can produce the most recent task records, newest first.
pub trait TaskSource {
    fn recent_tasks(&self, limit: usize) -> Result<Vec<TaskRecord>>;
}

/// Where the working set came from on the last [`TaskHistory::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Cached { records: usize },
    Fetched { records: usize, reason: MissReason },
    /// The fetch failed; the working set is empty.
    Failed { reason: MissReason },
}

/// Task-history component for one dashboard session.
pub struct TaskHistory {
    cache: CacheStore,
    policy: RefreshPolicy,
    records: Vec<TaskRecord>,
    max_records: usize,
    fetch_limit: usize,
}

impl TaskHistory {
    /// Build a history over `store` with default policy and limits.
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self::with_settings(store, RefreshPolicy::default(), MAX_RECORDS, MAX_RECORDS)
    }

    /// `max_records` is clamped to [`MAX_RECORDS`].
    pub fn with_settings(
        store: Box<dyn KeyValueStore>,
        policy: RefreshPolicy,
        max_records: usize,
        fetch_limit: usize,
    ) -> Self {
        Self {
            cache: CacheStore::new(store),
            policy,
            records: Vec::new(),
            max_records: max_records.min(MAX_RECORDS),
            fetch_limit,
        }
    }

    /// Build a history from the `[cache]` config section.
    ///
    /// Uses the configured storage file, falling back to
    /// `~/.botdash/storage.json`, and to a volatile store when no home
    /// directory can be found.
    pub fn from_config(config: &CacheConfig) -> Self {
        let store: Box<dyn KeyValueStore> = match &config.storage_path {
            Some(path) => Box::new(FileStore::open(path)),
            None => match FileStore::open_default() {
                Some(store) => Box::new(store),
                None => {
                    tracing::warn!("no home directory; task history will not persist");
                    Box::new(MemoryStore::new())
                }
            },
        };

        Self::with_settings(
            store,
            RefreshPolicy::from_minutes(config.ttl_minutes),
            config.max_records,
            config.fetch_limit,
        )
    }

    /// Current working set, newest first.
    pub fn records(&self) -> &[TaskRecord] {
        &self.records
    }

    pub fn policy(&self) -> &RefreshPolicy {
        &self.policy
    }

    /// Load the working set from cache when fresh, otherwise from `source`.
    pub fn load(&mut self, source: &dyn TaskSource, now: DateTime<Utc>) -> LoadOutcome {
        let reason = match self.policy.decide(now, &self.cache.read()) {
            Refresh::UseCache(records) => {
                // The file may have been written by a build with a larger cap.
                self.records = merge_capped(&records, &[], self.max_records);
                tracing::debug!(records = self.records.len(), "using cached task history");
                return LoadOutcome::Cached {
                    records: self.records.len(),
                };
            }
            Refresh::MustFetch(reason) => reason,
        };

        match reason {
            MissReason::BadWriteTime | MissReason::Malformed => {
                tracing::warn!(%reason, "ignoring unusable task history cache");
            }
            MissReason::Absent | MissReason::Expired { .. } => {
                tracing::debug!(%reason, "fetching task history");
            }
        }

        match source.recent_tasks(self.fetch_limit) {
            Ok(fetched) => {
                self.records = merge_capped(&fetched, &[], self.max_records);
                self.persist(now);
                LoadOutcome::Fetched {
                    records: self.records.len(),
                    reason,
                }
            }
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "failed to load task history");
                self.records.clear();
                LoadOutcome::Failed { reason }
            }
        }
    }

    /// Fetch from `source` regardless of cache age and merge the result into
    /// the working set.
    pub fn force_refresh(&mut self, source: &dyn TaskSource, now: DateTime<Utc>) -> Result<usize> {
        let fetched = source.recent_tasks(self.fetch_limit)?;
        Ok(self.absorb(&fetched, now))
    }

    /// Merge newly seen records into the working set and persist it.
    ///
    /// Returns the size of the working set afterwards. An empty batch
    /// changes nothing and writes nothing.
    pub fn absorb(&mut self, new_records: &[TaskRecord], now: DateTime<Utc>) -> usize {
        if new_records.is_empty() {
            return self.records.len();
        }

        self.records = merge_capped(new_records, &self.records, self.max_records);
        self.persist(now);
        tracing::debug!(records = self.records.len(), "task history updated");
        self.records.len()
    }

    /// Per-day counts of the working set over the window ending at `now`.
    pub fn trend<Tz: TimeZone>(&self, window: TrendWindow, now: &DateTime<Tz>) -> Vec<DayBucket> {
        aggregate(&self.records, window.days(), now)
    }

    fn persist(&mut self, now: DateTime<Utc>) {
        if let Err(e) = self.cache.write(&self.records, now) {
            tracing::warn!(error = %format!("{e:#}"), "failed to write task history cache");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Cache-or-fetch decision for the task history.
//!
//! The cache is served only when every part of the stored entry checks out:
//! both keys present, a numeric write time younger than the TTL, and a
//! records payload that parses. Anything else is a miss, never an error.

use chrono::{DateTime, Duration, Utc};

use super::cache::StoredPayload;
use super::record::TaskRecord;

/// Default cache lifetime in minutes.
pub const DEFAULT_TTL_MINUTES: u64 = 30;

/// Outcome of a policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    /// The cached records are fresh and valid.
    UseCache(Vec<TaskRecord>),
    /// The caller must fetch from the server.
    MustFetch(MissReason),
}

/// Why the cache was not used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    /// No entry, or only half of one.
    Absent,
    /// The write time is not an integer.
    BadWriteTime,
    /// The entry is older than the TTL.
    Expired { age_ms: i64 },
    /// The records payload is not a valid record array.
    Malformed,
}

impl std::fmt::Display for MissReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absent => write!(f, "no cache entry"),
            Self::BadWriteTime => write!(f, "unreadable cache write time"),
            Self::Expired { age_ms } => write!(f, "cache expired ({}s old)", age_ms / 1000),
            Self::Malformed => write!(f, "malformed cache payload"),
        }
    }
}

/// Time-boxed cache validity policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    ttl: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self::from_minutes(DEFAULT_TTL_MINUTES)
    }
}

impl RefreshPolicy {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn from_minutes(minutes: u64) -> Self {
        Self::new(Duration::minutes(minutes.min(u64::from(u32::MAX)) as i64))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Decide between serving `stored` and fetching fresh data.
    pub fn decide(&self, now: DateTime<Utc>, stored: &StoredPayload) -> Refresh {
        let (Some(records), Some(written_at)) = (&stored.records, &stored.written_at) else {
            return Refresh::MustFetch(MissReason::Absent);
        };

        let Ok(written_at) = written_at.trim().parse::<i64>() else {
            return Refresh::MustFetch(MissReason::BadWriteTime);
        };

        let age_ms = now.timestamp_millis().saturating_sub(written_at);
        if age_ms >= self.ttl.num_milliseconds() {
            return Refresh::MustFetch(MissReason::Expired { age_ms });
        }

        match serde_json::from_str::<Vec<TaskRecord>>(records) {
            Ok(records) => Refresh::UseCache(records),
            Err(_) => Refresh::MustFetch(MissReason::Malformed),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

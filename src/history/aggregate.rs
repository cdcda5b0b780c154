//! Per-day bucketing of task records for the trend chart.
//!
//! Buckets are keyed by `NaiveDate` in the timezone of the supplied `now`,
//! never by formatted strings, so two different days can't share a label.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use super::record::TaskRecord;

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

/// Number of task runs on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub count: usize,
}

impl DayBucket {
    /// Short chart label, e.g. `Jan 5`.
    pub fn label(&self) -> String {
        self.date.format("%b %-d").to_string()
    }
}

/// Count `records` per calendar day over the `window_days` days ending at
/// the date of `now`, oldest first.
///
/// Every day in the window is present even when it has no records.
/// Records outside the window, or with an unparseable timestamp, are
/// skipped. A window reaching past the earliest representable date gives
/// no buckets.
pub fn aggregate<Tz: TimeZone>(
    records: &[TaskRecord],
    window_days: u32,
    now: &DateTime<Tz>,
) -> Vec<DayBucket> {
    if window_days == 0 {
        return Vec::new();
    }

    let today = now.date_naive();
    let Some(first) = today.checked_sub_days(Days::new(u64::from(window_days - 1))) else {
        return Vec::new();
    };

    let mut buckets: Vec<DayBucket> = (0..window_days)
        .filter_map(|offset| first.checked_add_days(Days::new(u64::from(offset))))
        .map(|date| DayBucket { date, count: 0 })
        .collect();

    let tz = now.timezone();
    for record in records {
        let Some(day) = record.timestamp.local_date(&tz) else {
            continue;
        };
        if day < first || day > today {
            continue;
        }
        let index = (day - first).num_days() as usize;
        if let Some(bucket) = buckets.get_mut(index) {
            bucket.count += 1;
        }
    }

    buckets
}

// ---------------------------------------------------------------------------
// Windows
// ---------------------------------------------------------------------------

/// Trend window sizes offered by the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendWindow {
    #[default]
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
}

impl TrendWindow {
    pub const ALL: [TrendWindow; 3] = [Self::Week, Self::Month, Self::Quarter];

    pub fn days(self) -> u32 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
        }
    }

    /// Human-readable window description.
    pub fn label(self) -> String {
        format!("last {} days", self.days())
    }
}

impl fmt::Display for TrendWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.days())
    }
}

impl FromStr for TrendWindow {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7d" | "7" | "week" => Ok(Self::Week),
            "30d" | "30" | "month" => Ok(Self::Month),
            "90d" | "90" | "quarter" => Ok(Self::Quarter),
            other => anyhow::bail!("unsupported trend window '{other}' (expected 7d, 30d or 90d)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

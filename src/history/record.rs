use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Naive (zone-less) layouts the backend is known to emit. Interpreted in
/// the caller's timezone. `%.f` also matches an absent fraction.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Task-type labels the backend uses for manually triggered summaries.
const MANUAL_LABELS: &[&str] = &["manual-trigger", "manual", "手动触发总结"];

/// Task-type labels the backend uses for scheduled runs.
const SCHEDULED_LABELS: &[&str] = &["scheduled", "定时任务"];

/// Status labels that mark a failed run.
const FAILED_LABELS: &[&str] = &["failed", "failure", "失败"];

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// Point-in-time identifier of a task run, as sent by the server.
///
/// Either epoch milliseconds or a date-time string. This is also the
/// dedupe key, so equality is on the raw wire value: `"2025-01-05T10:00:00"`
/// and the equivalent epoch number are different keys. A float with no
/// fractional part decodes to the same key as the integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged, from = "RawTimestamp")]
pub enum TaskTimestamp {
    Epoch(i64),
    /// Epoch milliseconds with a fractional part, kept as sent.
    Fractional(serde_json::Number),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Int(i64),
    Num(serde_json::Number),
    Text(String),
}

impl From<RawTimestamp> for TaskTimestamp {
    fn from(raw: RawTimestamp) -> Self {
        match raw {
            RawTimestamp::Int(ms) => Self::Epoch(ms),
            RawTimestamp::Num(n) => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                    Self::Epoch(f as i64)
                }
                _ => Self::Fractional(n),
            },
            RawTimestamp::Text(raw) => Self::Text(raw),
        }
    }
}

impl TaskTimestamp {
    /// Resolve the timestamp to a date-time in `tz`.
    ///
    /// Strings with an explicit offset (RFC 3339) are converted; naive
    /// strings are taken as wall-clock time in `tz`. Returns `None` for
    /// anything unparseable.
    pub fn to_datetime<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Tz>> {
        match self {
            Self::Epoch(ms) => tz.timestamp_millis_opt(*ms).single(),
            Self::Fractional(n) => {
                let ms = n.as_f64().filter(|f| f.is_finite())?.trunc();
                tz.timestamp_millis_opt(ms as i64).single()
            }
            Self::Text(raw) => parse_text(raw.trim(), tz),
        }
    }

    /// Calendar day of the timestamp in `tz`.
    pub fn local_date<Tz: TimeZone>(&self, tz: &Tz) -> Option<NaiveDate> {
        self.to_datetime(tz).map(|dt| dt.date_naive())
    }
}

fn parse_text<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(tz));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return tz.from_local_datetime(&naive).earliest();
        }
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    tz.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).earliest()
}

impl fmt::Display for TaskTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Epoch(ms) => write!(f, "{ms}"),
            Self::Fractional(n) => write!(f, "{n}"),
            Self::Text(raw) => f.write_str(raw),
        }
    }
}

impl From<i64> for TaskTimestamp {
    fn from(ms: i64) -> Self {
        Self::Epoch(ms)
    }
}

impl From<&str> for TaskTimestamp {
    fn from(raw: &str) -> Self {
        Self::Text(raw.to_string())
    }
}

impl From<String> for TaskTimestamp {
    fn from(raw: String) -> Self {
        Self::Text(raw)
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One logged execution of the bot's summary task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub timestamp: TaskTimestamp,
    #[serde(default)]
    pub channel: String,
    #[serde(default, alias = "taskType")]
    pub task_type: String,
    #[serde(default)]
    pub status: String,
}

impl TaskRecord {
    pub fn new(
        timestamp: impl Into<TaskTimestamp>,
        channel: impl Into<String>,
        task_type: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            channel: channel.into(),
            task_type: task_type.into(),
            status: status.into(),
        }
    }

    pub fn is_manual(&self) -> bool {
        matches_label(&self.task_type, MANUAL_LABELS)
    }

    pub fn is_scheduled(&self) -> bool {
        matches_label(&self.task_type, SCHEDULED_LABELS)
    }

    pub fn is_failed(&self) -> bool {
        matches_label(&self.status, FAILED_LABELS)
    }
}

fn matches_label(value: &str, labels: &[&str]) -> bool {
    let value = value.trim();
    labels.iter().any(|label| value.eq_ignore_ascii_case(label))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn deserializes_string_and_numeric_timestamps() {
        let json = r#"[
            {"timestamp": "2025-01-05T10:00:00", "channel": "news", "task_type": "scheduled", "status": "success"},
            {"timestamp": 1736071200000, "channel": "dev", "taskType": "manual-trigger", "status": "failed"}
        ]"#;
        let records: Vec<TaskRecord> = serde_json::from_str(json).unwrap();

        assert_eq!(records[0].timestamp, TaskTimestamp::from("2025-01-05T10:00:00"));
        assert_eq!(records[1].timestamp, TaskTimestamp::Epoch(1_736_071_200_000));
        assert_eq!(records[1].task_type, "manual-trigger");
    }

    #[test]
    fn float_epochs_decode_alongside_other_records() {
        let json = r#"[
            {"timestamp": "2025-01-15T09:00:00Z", "channel": "news"},
            {"timestamp": 1736935200000.0, "channel": "dev"},
            {"timestamp": 1736935200000.5, "channel": "ops"}
        ]"#;
        let records: Vec<TaskRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[1].timestamp, TaskTimestamp::Epoch(1_736_935_200_000));
        assert!(matches!(records[2].timestamp, TaskTimestamp::Fractional(_)));

        // 2025-01-15T10:00:00Z
        let expected = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).single();
        assert_eq!(records[1].timestamp.to_datetime(&Utc), expected);
        assert_eq!(records[2].timestamp.to_datetime(&Utc), expected);
    }

    #[test]
    fn fractional_epoch_survives_a_cache_round_trip() {
        let ts: TaskTimestamp = serde_json::from_str("1736935200000.5").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "1736935200000.5");
        assert_eq!(serde_json::from_str::<TaskTimestamp>(&json).unwrap(), ts);
    }

    #[test]
    fn missing_display_fields_default_to_empty() {
        let record: TaskRecord = serde_json::from_str(r#"{"timestamp": 5}"#).unwrap();
        assert_eq!(record.channel, "");
        assert_eq!(record.status, "");
    }

    #[test]
    fn epoch_millis_resolve_in_timezone() {
        // 2025-01-05T23:30:00Z
        let ts = TaskTimestamp::Epoch(1_736_119_800_000);
        assert_eq!(
            ts.local_date(&Utc),
            NaiveDate::from_ymd_opt(2025, 1, 5)
        );

        let east = FixedOffset::east_opt(8 * 3600).unwrap();
        assert_eq!(
            ts.local_date(&east),
            NaiveDate::from_ymd_opt(2025, 1, 6)
        );
    }

    #[test]
    fn offset_strings_are_converted() {
        let ts = TaskTimestamp::from("2025-01-05T23:30:00+00:00");
        let east = FixedOffset::east_opt(8 * 3600).unwrap();
        assert_eq!(
            ts.local_date(&east),
            NaiveDate::from_ymd_opt(2025, 1, 6)
        );
    }

    #[test]
    fn naive_strings_use_wall_clock_of_timezone() {
        let east = FixedOffset::east_opt(8 * 3600).unwrap();
        for raw in [
            "2025-01-05T23:30:00",
            "2025-01-05 23:30:00",
            "2025-01-05T23:30:00.123456",
            "2025-01-05",
        ] {
            let ts = TaskTimestamp::from(raw);
            assert_eq!(
                ts.local_date(&east),
                NaiveDate::from_ymd_opt(2025, 1, 5),
                "{raw}"
            );
        }
    }

    #[test]
    fn garbage_timestamp_has_no_date() {
        assert_eq!(TaskTimestamp::from("yesterday-ish").local_date(&Utc), None);
    }

    #[test]
    fn label_helpers() {
        let manual = TaskRecord::new(1_i64, "c", "Manual-Trigger", "success");
        assert!(manual.is_manual());
        assert!(!manual.is_scheduled());
        assert!(!manual.is_failed());

        let scheduled = TaskRecord::new(2_i64, "c", "定时任务", "失败");
        assert!(scheduled.is_scheduled());
        assert!(scheduled.is_failed());
    }
}

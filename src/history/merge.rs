//! Merge/dedupe stage for the task-history working set.
//!
//! Pure functions only. Callers persist the result and re-run aggregation.

use std::collections::HashSet;

use serde_json::Value;

use super::record::TaskRecord;

/// Upper bound on retained task records.
pub const MAX_RECORDS: usize = 200;

/// Merge `new` records in front of `existing`, dedupe by timestamp and cap
/// the result at [`MAX_RECORDS`].
///
/// New records come first, so on a duplicate timestamp the freshly fetched
/// copy wins.
pub fn merge(new: &[TaskRecord], existing: &[TaskRecord]) -> Vec<TaskRecord> {
    merge_capped(new, existing, MAX_RECORDS)
}

/// [`merge`] with an explicit cap.
pub fn merge_capped(new: &[TaskRecord], existing: &[TaskRecord], cap: usize) -> Vec<TaskRecord> {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(cap.min(new.len() + existing.len()));

    for record in new.iter().chain(existing) {
        if merged.len() >= cap {
            break;
        }
        if seen.insert(&record.timestamp) {
            merged.push(record.clone());
        }
    }

    merged
}

/// Parse a JSON value as a sequence of task records.
///
/// Returns `None` unless `value` is an array whose every element is a
/// well-formed record.
pub fn parse_records(value: &Value) -> Option<Vec<TaskRecord>> {
    if !value.is_array() {
        return None;
    }
    serde_json::from_value(value.clone()).ok()
}

/// Merge an untyped payload into `existing`.
///
/// A payload that is not a well-formed record array leaves `existing`
/// unchanged.
pub fn merge_json(new: &Value, existing: &[TaskRecord]) -> Vec<TaskRecord> {
    match parse_records(new) {
        Some(records) => merge(&records, existing),
        None => existing.to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Retention of the recent reading window.
//!
//! The retained set is rebuilt on every merge rather than patched in place:
//! `merge(batch) = sort(prune(batch ∪ previous))`. The result is always
//! ordered newest first and depends only on the inputs and `now`.

use std::collections::HashSet;

use chrono::{DateTime, TimeDelta, Utc};

use crate::Reading;

// ---

/// Bounds applied to the retained set on every merge.
///
/// `time_window` and `max_count` are normally used one at a time. When both
/// are set the time prune runs first and the count bound truncates the
/// sorted survivors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetentionPolicy {
    // ---
    /// Maximum age of a retained reading relative to `now`.
    pub time_window: Option<TimeDelta>,

    /// Maximum number of readings kept after sorting.
    pub max_count: Option<usize>,

    /// Keep only the first `(sensor_id, timestamp)` occurrence, incoming first.
    pub dedupe: bool,
}

impl RetentionPolicy {
    // ---
    pub fn time_window(window: TimeDelta) -> Self {
        Self {
            time_window: Some(window),
            ..Self::default()
        }
    }

    pub fn max_count(count: usize) -> Self {
        Self {
            max_count: Some(count),
            ..Self::default()
        }
    }
}

/// Merge an incoming batch into the existing retained set.
///
/// Incoming readings precede existing ones before the stable sort, so readings
/// with equal timestamps keep arrival order. An empty batch still re-applies
/// pruning to `existing`.
pub fn merge(
    existing: &[Reading],
    incoming: Vec<Reading>,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> Vec<Reading> {
    // ---
    let mut merged = incoming;
    merged.extend_from_slice(existing);

    if policy.dedupe {
        let mut seen = HashSet::with_capacity(merged.len());
        merged.retain(|r| seen.insert((r.sensor_id.clone(), r.timestamp)));
    }

    if let Some(window) = policy.time_window {
        // Unrepresentable cutoff means nothing is old enough to drop
        if let Some(cutoff) = now.checked_sub_signed(window) {
            merged.retain(|r| r.timestamp >= cutoff);
        }
    }

    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    if let Some(max_count) = policy.max_count {
        merged.truncate(max_count);
    }

    tracing::trace!(
        existing = existing.len(),
        retained = merged.len(),
        "merged reading batch"
    );
    merged
}

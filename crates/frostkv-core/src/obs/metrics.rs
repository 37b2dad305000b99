use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    collections::BTreeMap,
    sync::LazyLock,
    time::{SystemTime, UNIX_EPOCH},
};

///
/// EventState
/// Ephemeral, in-memory counters and simple latency totals for operations.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub perf: EventPerf,
    pub models: BTreeMap<String, ModelCounters>,
    pub since_ms: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            perf: EventPerf::default(),
            models: BTreeMap::new(),
            since_ms: now_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Executor entrypoints
    pub load_calls: u64,
    pub save_calls: u64,
    pub delete_calls: u64,
    pub lookup_calls: u64,
    pub count_calls: u64,

    // Rows touched
    pub rows_loaded: u64,
    pub rows_saved: u64,
    pub rows_deleted: u64,

    // Index maintenance
    pub index_inserts: u64,
    pub index_removes: u64,

    // Store submissions
    pub batches_submitted: u64,
    pub batches_failed: u64,
    pub commands_submitted: u64,
}

///
/// ModelCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ModelCounters {
    pub load_calls: u64,
    pub save_calls: u64,
    pub delete_calls: u64,
    pub lookup_calls: u64,
    pub rows_loaded: u64,
    pub rows_saved: u64,
    pub rows_deleted: u64,
    pub index_inserts: u64,
    pub index_removes: u64,
    pub batches_failed: u64,
}

///
/// EventPerf
/// Wall-clock totals per executor kind, in microseconds.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventPerf {
    pub load_micros_total: u128,
    pub save_micros_total: u128,
    pub delete_micros_total: u128,

    pub load_micros_max: u64,
    pub save_micros_max: u64,
    pub delete_micros_max: u64,
}

static EVENT_STATE: LazyLock<Mutex<EventState>> =
    LazyLock::new(|| Mutex::new(EventState::default()));

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    f(&EVENT_STATE.lock())
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    f(&mut EVENT_STATE.lock())
}

/// Reset all counters and perf totals.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

/// Accumulate a duration and track a max.
pub(crate) fn add_micros(total: &mut u128, max: &mut u64, delta: u64) {
    *total = total.saturating_add(u128::from(delta));
    if delta > *max {
        *max = delta;
    }
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    /// Ephemeral runtime counters since `since_ms`.
    pub counters: Option<EventState>,
    /// Per-model counters and averages.
    pub model_counters: Vec<ModelSummary>,
}

///
/// ModelSummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ModelSummary {
    pub name: String,
    pub load_calls: u64,
    pub save_calls: u64,
    pub delete_calls: u64,
    pub rows_loaded: u64,
    pub rows_saved: u64,
    pub rows_deleted: u64,
    pub avg_rows_per_load: f64,
    pub avg_rows_per_delete: f64,
    pub index_inserts: u64,
    pub index_removes: u64,
    pub batches_failed: u64,
}

fn ratio(rows: u64, calls: u64) -> f64 {
    if calls > 0 {
        rows as f64 / calls as f64
    } else {
        0.0
    }
}

/// Build a report from the in-memory counters.
///
/// `window_start_ms` drops the report when the current window began
/// before the given instant.
#[must_use]
pub(crate) fn report_window_start(window_start_ms: Option<u64>) -> EventReport {
    let snap = with_state(Clone::clone);
    if let Some(start) = window_start_ms
        && snap.since_ms < start
    {
        return EventReport::default();
    }

    let mut model_counters: Vec<ModelSummary> = snap
        .models
        .iter()
        .map(|(name, ops)| ModelSummary {
            name: name.clone(),
            load_calls: ops.load_calls,
            save_calls: ops.save_calls,
            delete_calls: ops.delete_calls,
            rows_loaded: ops.rows_loaded,
            rows_saved: ops.rows_saved,
            rows_deleted: ops.rows_deleted,
            avg_rows_per_load: ratio(ops.rows_loaded, ops.load_calls),
            avg_rows_per_delete: ratio(ops.rows_deleted, ops.delete_calls),
            index_inserts: ops.index_inserts,
            index_removes: ops.index_removes,
            batches_failed: ops.batches_failed,
        })
        .collect();

    model_counters.sort_by(|a, b| {
        match b
            .avg_rows_per_load
            .partial_cmp(&a.avg_rows_per_load)
            .unwrap_or(Ordering::Equal)
        {
            Ordering::Equal => match b.rows_loaded.cmp(&a.rows_loaded) {
                Ordering::Equal => a.name.cmp(&b.name),
                other => other,
            },
            other => other,
        }
    });

    EventReport {
        counters: Some(snap),
        model_counters,
    }
}

///
/// TESTS
///

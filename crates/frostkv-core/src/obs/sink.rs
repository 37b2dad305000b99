//! Metrics sink boundary.
//!
//! Executor code never touches `obs::metrics` directly. All instrumentation
//! flows through `MetricsEvent` and the `MetricsSink` installed on the `Db`.
use crate::obs::metrics;
use std::time::Instant;

///
/// ExecKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecKind {
    Load,
    Save,
    Delete,
    Lookup,
    Count,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent<'a> {
    ExecStart {
        kind: ExecKind,
        model: &'a str,
    },
    ExecFinish {
        kind: ExecKind,
        model: &'a str,
        rows_touched: u64,
        micros: u64,
    },
    IndexDelta {
        model: &'a str,
        inserts: u64,
        removes: u64,
    },
    BatchSubmitted {
        model: &'a str,
        commands: u64,
    },
    BatchFailed {
        model: &'a str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink: Send + Sync {
    fn record(&self, event: MetricsEvent<'_>);
}

///
/// NoopMetricsSink
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn record(&self, _: MetricsEvent<'_>) {}
}

///
/// GlobalMetricsSink
/// Default sink; writes into the process-wide counters.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::ExecStart { kind, model } => {
                metrics::with_state_mut(|m| {
                    let ops = &mut m.ops;
                    let calls = match kind {
                        ExecKind::Load => &mut ops.load_calls,
                        ExecKind::Save => &mut ops.save_calls,
                        ExecKind::Delete => &mut ops.delete_calls,
                        ExecKind::Lookup => &mut ops.lookup_calls,
                        ExecKind::Count => &mut ops.count_calls,
                    };
                    *calls = calls.saturating_add(1);

                    let entry = m.models.entry(model.to_string()).or_default();
                    match kind {
                        ExecKind::Load => entry.load_calls = entry.load_calls.saturating_add(1),
                        ExecKind::Save => entry.save_calls = entry.save_calls.saturating_add(1),
                        ExecKind::Delete => {
                            entry.delete_calls = entry.delete_calls.saturating_add(1);
                        }
                        ExecKind::Lookup => {
                            entry.lookup_calls = entry.lookup_calls.saturating_add(1);
                        }
                        ExecKind::Count => {}
                    }
                });
            }

            MetricsEvent::ExecFinish {
                kind,
                model,
                rows_touched,
                micros,
            } => {
                metrics::with_state_mut(|m| {
                    match kind {
                        ExecKind::Load => {
                            m.ops.rows_loaded = m.ops.rows_loaded.saturating_add(rows_touched);
                            metrics::add_micros(
                                &mut m.perf.load_micros_total,
                                &mut m.perf.load_micros_max,
                                micros,
                            );
                        }
                        ExecKind::Save => {
                            m.ops.rows_saved = m.ops.rows_saved.saturating_add(rows_touched);
                            metrics::add_micros(
                                &mut m.perf.save_micros_total,
                                &mut m.perf.save_micros_max,
                                micros,
                            );
                        }
                        ExecKind::Delete => {
                            m.ops.rows_deleted = m.ops.rows_deleted.saturating_add(rows_touched);
                            metrics::add_micros(
                                &mut m.perf.delete_micros_total,
                                &mut m.perf.delete_micros_max,
                                micros,
                            );
                        }
                        ExecKind::Lookup | ExecKind::Count => {}
                    }

                    let entry = m.models.entry(model.to_string()).or_default();
                    match kind {
                        ExecKind::Load => {
                            entry.rows_loaded = entry.rows_loaded.saturating_add(rows_touched);
                        }
                        ExecKind::Save => {
                            entry.rows_saved = entry.rows_saved.saturating_add(rows_touched);
                        }
                        ExecKind::Delete => {
                            entry.rows_deleted = entry.rows_deleted.saturating_add(rows_touched);
                        }
                        ExecKind::Lookup | ExecKind::Count => {}
                    }
                });
            }

            MetricsEvent::IndexDelta {
                model,
                inserts,
                removes,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.index_inserts = m.ops.index_inserts.saturating_add(inserts);
                    m.ops.index_removes = m.ops.index_removes.saturating_add(removes);
                    let entry = m.models.entry(model.to_string()).or_default();
                    entry.index_inserts = entry.index_inserts.saturating_add(inserts);
                    entry.index_removes = entry.index_removes.saturating_add(removes);
                });
            }

            MetricsEvent::BatchSubmitted { commands, .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.batches_submitted = m.ops.batches_submitted.saturating_add(1);
                    m.ops.commands_submitted = m.ops.commands_submitted.saturating_add(commands);
                });
            }

            MetricsEvent::BatchFailed { model } => {
                metrics::with_state_mut(|m| {
                    m.ops.batches_failed = m.ops.batches_failed.saturating_add(1);
                    let entry = m.models.entry(model.to_string()).or_default();
                    entry.batches_failed = entry.batches_failed.saturating_add(1);
                });
            }
        }
    }
}

/// Snapshot the current metrics state.
///
/// `window_start_ms` filters by window start (`EventState::since_ms`),
/// not by per-event timestamps.
#[must_use]
pub fn metrics_report(window_start_ms: Option<u64>) -> metrics::EventReport {
    metrics::report_window_start(window_start_ms)
}

/// Reset all metrics state (counters + perf).
pub fn metrics_reset_all() {
    metrics::reset_all();
}

///
/// Span
/// RAII guard that emits start/finish events for one executor call.
/// Finish accounting happens even on early return or unwind.
///

pub(crate) struct Span<'a> {
    sink: &'a dyn MetricsSink,
    kind: ExecKind,
    model: &'a str,
    start: Instant,
    rows: u64,
}

impl<'a> Span<'a> {
    #[must_use]
    pub(crate) fn new(sink: &'a dyn MetricsSink, kind: ExecKind, model: &'a str) -> Self {
        sink.record(MetricsEvent::ExecStart { kind, model });

        Self {
            sink,
            kind,
            model,
            start: Instant::now(),
            rows: 0,
        }
    }

    pub(crate) const fn set_rows(&mut self, rows: u64) {
        self.rows = rows;
    }
}

impl Drop for Span<'_> {
    fn drop(&mut self) {
        let micros = u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX);

        self.sink.record(MetricsEvent::ExecFinish {
            kind: self.kind,
            model: self.model,
            rows_touched: self.rows,
            micros,
        });
    }
}

///
/// TESTS
///

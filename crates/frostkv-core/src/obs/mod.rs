//! Observability: runtime telemetry (metrics) and the sink abstraction.
//!
//! Structured log events go through `tracing`; counters go through the
//! `MetricsSink` installed on each `Db`.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventPerf, EventReport, EventState, ModelCounters, ModelSummary};
pub use sink::{
    ExecKind, GlobalMetricsSink, MetricsEvent, MetricsSink, NoopMetricsSink, metrics_report,
    metrics_reset_all,
};

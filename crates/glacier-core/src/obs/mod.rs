//! Observability: per-thread event counters and the sink abstraction.
//!
//! Log lines go through `tracing`; no subscriber is installed here.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{CodecCounters, CompileCounters, EventReport, KindCounters};
pub use sink::{CodecFormat, EventSink, QueryEvent, event_report, event_reset_all, with_event_sink};

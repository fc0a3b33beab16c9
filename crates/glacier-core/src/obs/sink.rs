//! Event sink boundary.
//!
//! Codec and compile logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through QueryEvent and EventSink.
use crate::{
    node::QueryKind,
    obs::metrics::{self, bump},
};
use std::{cell::RefCell, fmt};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn EventSink>> = RefCell::new(None);
}

///
/// CodecFormat
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CodecFormat {
    Declarative,
    Wire,
}

impl fmt::Display for CodecFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Declarative => "declarative",
            Self::Wire => "wire",
        })
    }
}

///
/// QueryEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QueryEvent {
    Decoded { format: CodecFormat, kind: QueryKind },
    Encoded { format: CodecFormat, kind: QueryKind },
    DecodeFailed { format: CodecFormat },
    Compiled { kind: QueryKind, named: bool },
    CompileFailed { kind: QueryKind },
}

///
/// EventSink
///

pub trait EventSink {
    fn record(&self, event: QueryEvent);
}

/// GlobalEventSink
/// Default sink that writes into the per-thread event state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalEventSink;

impl EventSink for GlobalEventSink {
    fn record(&self, event: QueryEvent) {
        metrics::with_state_mut(|m| match event {
            QueryEvent::Decoded { format, kind } => {
                match format {
                    CodecFormat::Declarative => bump(&mut m.codec.declarative_decoded),
                    CodecFormat::Wire => bump(&mut m.codec.wire_decoded),
                }
                bump(&mut m.kinds.entry(kind.to_string()).or_default().decoded);
            }

            QueryEvent::Encoded { format, kind } => {
                match format {
                    CodecFormat::Declarative => bump(&mut m.codec.declarative_encoded),
                    CodecFormat::Wire => bump(&mut m.codec.wire_encoded),
                }
                bump(&mut m.kinds.entry(kind.to_string()).or_default().encoded);
            }

            QueryEvent::DecodeFailed { format } => match format {
                CodecFormat::Declarative => bump(&mut m.codec.declarative_failures),
                CodecFormat::Wire => bump(&mut m.codec.wire_failures),
            },

            QueryEvent::Compiled { kind, named } => {
                bump(&mut m.compile.compiled);
                if named {
                    bump(&mut m.compile.named_captures);
                }
                bump(&mut m.kinds.entry(kind.to_string()).or_default().compiled);
            }

            QueryEvent::CompileFailed { kind } => {
                bump(&mut m.compile.failures);
                bump(&mut m.kinds.entry(kind.to_string()).or_default().compile_failures);
            }
        });
    }
}

pub(crate) const GLOBAL_EVENT_SINK: GlobalEventSink = GlobalEventSink;

pub(crate) fn record(event: QueryEvent) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());
    if let Some(ptr) = override_ptr {
        // SAFETY:
        // - `ptr` was produced from a valid `&dyn EventSink` in `with_event_sink`.
        // - `with_event_sink` restores the previous pointer before returning,
        //   including unwind paths via `Guard::drop`.
        // - `record` is synchronous and never stores `ptr` beyond this call.
        unsafe { (&*ptr).record(event) };
    } else {
        GLOBAL_EVENT_SINK.record(event);
    }
}

/// Snapshot the current thread's event counters.
#[must_use]
pub fn event_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset the current thread's event counters.
pub fn event_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary event sink override on this thread.
pub fn with_event_sink<T>(sink: &dyn EventSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<*const dyn EventSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0;
            });
        }
    }

    // SAFETY:
    // - `sink_ptr` is installed only for this dynamic scope.
    // - `Guard` restores the previous slot on all exits, including panic.
    // - `record` only dereferences synchronously and never persists `sink_ptr`.
    let sink_ptr = unsafe { std::mem::transmute::<&dyn EventSink, *const dyn EventSink>(sink) };
    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink_ptr));
    let _guard = Guard(prev);

    f()
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CaptureSink(RefCell<Vec<QueryEvent>>);

    impl EventSink for CaptureSink {
        fn record(&self, event: QueryEvent) {
            self.0.borrow_mut().push(event);
        }
    }

    #[test]
    fn global_sink_counts_per_kind() {
        event_reset_all();
        record(QueryEvent::Decoded {
            format: CodecFormat::Wire,
            kind: QueryKind::Term,
        });
        record(QueryEvent::Compiled {
            kind: QueryKind::Term,
            named: true,
        });

        let report = event_report();
        assert_eq!(report.codec.wire_decoded, 1);
        assert_eq!(report.compile.named_captures, 1);
        assert_eq!(report.kinds["term"].decoded, 1);
        assert_eq!(report.kinds["term"].compiled, 1);
    }

    #[test]
    fn override_captures_events_and_restores_global_sink() {
        event_reset_all();
        let sink = CaptureSink::default();

        with_event_sink(&sink, || {
            record(QueryEvent::CompileFailed {
                kind: QueryKind::Range,
            });
        });
        record(QueryEvent::DecodeFailed {
            format: CodecFormat::Declarative,
        });

        assert_eq!(
            *sink.0.borrow(),
            vec![QueryEvent::CompileFailed {
                kind: QueryKind::Range
            }]
        );

        let report = event_report();
        assert_eq!(report.compile.failures, 0);
        assert_eq!(report.codec.declarative_failures, 1);
    }
}

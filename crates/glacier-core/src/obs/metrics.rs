use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};
use time::OffsetDateTime;

///
/// Metrics
/// Ephemeral, per-thread counters for codec and compile activity.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventState {
    pub codec: CodecCounters,
    pub compile: CompileCounters,
    pub kinds: BTreeMap<String, KindCounters>,
    pub since_ms: i64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            codec: CodecCounters::default(),
            compile: CompileCounters::default(),
            kinds: BTreeMap::new(),
            since_ms: now_millis(),
        }
    }
}

///
/// CodecCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CodecCounters {
    pub declarative_decoded: u64,
    pub declarative_encoded: u64,
    pub declarative_failures: u64,
    pub wire_decoded: u64,
    pub wire_encoded: u64,
    pub wire_failures: u64,
}

///
/// CompileCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CompileCounters {
    pub compiled: u64,
    pub named_captures: u64,
    pub failures: u64,
}

///
/// KindCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct KindCounters {
    pub decoded: u64,
    pub encoded: u64,
    pub compiled: u64,
    pub compile_failures: u64,
}

/// Point-in-time copy of the counters.
pub type EventReport = EventState;

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

#[expect(clippy::cast_possible_truncation)]
fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters (useful in tests).
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

#[must_use]
pub(crate) fn report() -> EventReport {
    with_state(Clone::clone)
}

/// Saturating increment used by every counter.
pub(crate) const fn bump(counter: &mut u64) {
    *counter = counter.saturating_add(1);
}

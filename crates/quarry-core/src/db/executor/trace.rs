//! Query lifecycle events for caller-supplied sinks.
//!
//! A sink observes executions; it never changes their result.

use crate::{db::query::QueryFingerprint, error::ErrorClass};

///
/// QueryTraceSink
///

pub trait QueryTraceSink {
    fn on_event(&self, event: QueryTraceEvent);
}

///
/// QueryState
///
/// Lifecycle of one execution: `Built → Planned → Executing → Completed | Failed`.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QueryState {
    Built,
    Planned,
    Executing,
    Completed,
    Failed,
}

///
/// TracePhase
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TracePhase {
    Scan,
    Join,
    Filter,
    Group,
    Order,
    Page,
    Project,
    Count,
}

///
/// QueryTraceEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QueryTraceEvent {
    Planned {
        fingerprint: QueryFingerprint,
        grouped: bool,
    },
    Phase {
        fingerprint: QueryFingerprint,
        phase: TracePhase,
        rows: u64,
    },
    Completed {
        fingerprint: QueryFingerprint,
        rows: u64,
    },
    Failed {
        fingerprint: QueryFingerprint,
        class: ErrorClass,
    },
}

impl QueryTraceEvent {
    /// State the query is in once this event has been emitted.
    #[must_use]
    pub const fn state(&self) -> QueryState {
        match self {
            Self::Planned { .. } => QueryState::Planned,
            Self::Phase { .. } => QueryState::Executing,
            Self::Completed { .. } => QueryState::Completed,
            Self::Failed { .. } => QueryState::Failed,
        }
    }

    #[must_use]
    pub const fn fingerprint(&self) -> QueryFingerprint {
        match self {
            Self::Planned { fingerprint, .. }
            | Self::Phase { fingerprint, .. }
            | Self::Completed { fingerprint, .. }
            | Self::Failed { fingerprint, .. } => *fingerprint,
        }
    }
}

///
/// TraceScope
///

pub(crate) struct TraceScope<'a> {
    sink: Option<&'a dyn QueryTraceSink>,
    fingerprint: QueryFingerprint,
}

impl<'a> TraceScope<'a> {
    pub(crate) const fn new(
        sink: Option<&'a dyn QueryTraceSink>,
        fingerprint: QueryFingerprint,
    ) -> Self {
        Self { sink, fingerprint }
    }

    pub(crate) fn planned(&self, grouped: bool) {
        self.emit(QueryTraceEvent::Planned {
            fingerprint: self.fingerprint,
            grouped,
        });
    }

    pub(crate) fn phase(&self, phase: TracePhase, rows: usize) {
        tracing::debug!(fingerprint = %self.fingerprint, ?phase, rows, "query phase");
        self.emit(QueryTraceEvent::Phase {
            fingerprint: self.fingerprint,
            phase,
            rows: saturating_u64(rows),
        });
    }

    pub(crate) fn completed(self, rows: usize) {
        self.emit(QueryTraceEvent::Completed {
            fingerprint: self.fingerprint,
            rows: saturating_u64(rows),
        });
    }

    pub(crate) fn failed(self, class: ErrorClass) {
        tracing::debug!(fingerprint = %self.fingerprint, %class, "query failed");
        self.emit(QueryTraceEvent::Failed {
            fingerprint: self.fingerprint,
            class,
        });
    }

    fn emit(&self, event: QueryTraceEvent) {
        if let Some(sink) = self.sink {
            sink.on_event(event);
        }
    }
}

fn saturating_u64(rows: usize) -> u64 {
    u64::try_from(rows).unwrap_or(u64::MAX)
}

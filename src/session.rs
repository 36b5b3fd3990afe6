//! Monitoring session: one aggregator per run, selected at startup
//!
//! The set of event shapes is closed, so the aggregator is a plain enum rather
//! than a registry of handlers. The event source and the renderer share a
//! session through an `Arc` and never talk to each other directly.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::blocks::BlockAggregator;
use crate::error::{MonitorError, Result};
use crate::interval::IntervalAggregator;
use crate::invocation::InvocationAggregator;
use crate::projector::Column;
use crate::snapshot::{DetailedEvent, SnapshotEntry};
use crate::trace_event::TraceEvent;

/// What a session monitors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorKind {
    /// Source generator invocations
    Generator,
    /// Server compilations (start/stop pairs)
    Compilation,
    /// Workspace operation blocks
    Workspace,
}

const GENERATOR_COLUMNS: &[Column] = &[
    Column::Name,
    Column::Count,
    Column::Mean,
    Column::P90,
    Column::Total,
    Column::Failures,
];

const COMPILATION_COLUMNS: &[Column] = &[
    Column::Name,
    Column::Count,
    Column::Mean,
    Column::P90,
    Column::Total,
];

const WORKSPACE_COLUMNS: &[Column] = &[
    Column::Name,
    Column::Completed,
    Column::Canceled,
    Column::Mean,
    Column::P90,
    Column::Total,
];

impl MonitorKind {
    pub fn label(self) -> &'static str {
        match self {
            MonitorKind::Generator => "generator",
            MonitorKind::Compilation => "compilation",
            MonitorKind::Workspace => "workspace",
        }
    }

    /// Columns of this kind's table, in display order
    pub fn columns(self) -> &'static [Column] {
        match self {
            MonitorKind::Generator => GENERATOR_COLUMNS,
            MonitorKind::Compilation => COMPILATION_COLUMNS,
            MonitorKind::Workspace => WORKSPACE_COLUMNS,
        }
    }

    pub fn supports(self, column: Column) -> bool {
        self.columns().contains(&column)
    }

    /// Column selected by digit key `key` (`'1'` is the first column)
    pub fn column_for_key(self, key: char) -> Option<Column> {
        let index = key.to_digit(10)?.checked_sub(1)? as usize;
        self.columns().get(index).copied()
    }

    /// Live view redraw interval
    pub fn default_refresh(self) -> Duration {
        match self {
            MonitorKind::Compilation => Duration::from_millis(1000),
            MonitorKind::Generator | MonitorKind::Workspace => Duration::from_millis(100),
        }
    }
}

impl fmt::Display for MonitorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The aggregator variant owned by a session
#[derive(Debug)]
pub enum Aggregator {
    Invocation(InvocationAggregator),
    Interval(IntervalAggregator),
    Blocks(BlockAggregator),
}

impl Aggregator {
    pub fn for_kind(kind: MonitorKind) -> Self {
        match kind {
            MonitorKind::Generator => Aggregator::Invocation(InvocationAggregator::new()),
            MonitorKind::Compilation => Aggregator::Interval(IntervalAggregator::new()),
            MonitorKind::Workspace => Aggregator::Blocks(BlockAggregator::new()),
        }
    }

    pub fn kind(&self) -> MonitorKind {
        match self {
            Aggregator::Invocation(_) => MonitorKind::Generator,
            Aggregator::Interval(_) => MonitorKind::Compilation,
            Aggregator::Blocks(_) => MonitorKind::Workspace,
        }
    }
}

/// State of one monitoring run
#[derive(Debug)]
pub struct MonitorSession {
    aggregator: Aggregator,
}

impl MonitorSession {
    pub fn new(kind: MonitorKind) -> Self {
        Self {
            aggregator: Aggregator::for_kind(kind),
        }
    }

    pub fn kind(&self) -> MonitorKind {
        self.aggregator.kind()
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Route one trace event to the session's aggregator
    ///
    /// Returns [`MonitorError::UnsupportedEvent`] when the event belongs to a
    /// different kind of session; callers are expected to check
    /// [`TraceEvent::kind`] first.
    pub fn dispatch(&self, event: &TraceEvent) -> Result<()> {
        match (&self.aggregator, event) {
            (
                Aggregator::Invocation(aggregator),
                TraceEvent::Invocation {
                    name,
                    duration_ticks,
                    timestamp,
                },
            ) => aggregator.record_invocation(name, *duration_ticks, *timestamp),
            (Aggregator::Invocation(aggregator), TraceEvent::Exception { name, timestamp }) => {
                aggregator.record_failure(name, *timestamp)
            }
            (Aggregator::Interval(aggregator), TraceEvent::CompilationStart { name, timestamp }) => {
                aggregator.record_start(name, *timestamp)
            }
            (Aggregator::Interval(aggregator), TraceEvent::CompilationStop { name, timestamp }) => {
                aggregator.record_stop(name, *timestamp)
            }
            (Aggregator::Blocks(aggregator), TraceEvent::BlockCompleted { id, duration_ms }) => {
                aggregator.record_block_completed(*id, *duration_ms)
            }
            (Aggregator::Blocks(aggregator), TraceEvent::BlockCanceled { id, duration_ms }) => {
                aggregator.record_block_canceled(*id, *duration_ms)
            }
            (Aggregator::Blocks(aggregator), TraceEvent::FunctionDefinitions { definitions }) => {
                aggregator.register_name_table(definitions)
            }
            (_, other) => {
                return Err(MonitorError::UnsupportedEvent {
                    kind: self.kind(),
                    event: other.label(),
                })
            }
        }
        Ok(())
    }

    /// Full snapshot, unsorted
    pub fn snapshot(&self) -> Vec<SnapshotEntry> {
        match &self.aggregator {
            Aggregator::Invocation(aggregator) => aggregator.snapshot(),
            Aggregator::Interval(aggregator) => aggregator.snapshot(),
            Aggregator::Blocks(aggregator) => aggregator.snapshot(),
        }
    }

    /// Snapshot as shown in the live table
    ///
    /// Compilations with a blank name are hidden; exports still include them.
    pub fn live_snapshot(&self) -> Vec<SnapshotEntry> {
        let mut entries = self.snapshot();
        if self.kind() == MonitorKind::Compilation {
            entries.retain(|entry| !entry.name.trim().is_empty());
        }
        entries
    }

    /// Detailed event log, unsorted; workspace blocks carry no timestamps and keep none
    pub fn detailed_events(&self) -> Vec<DetailedEvent> {
        match &self.aggregator {
            Aggregator::Invocation(aggregator) => aggregator.detailed_events(),
            Aggregator::Interval(aggregator) => aggregator.detailed_events(),
            Aggregator::Blocks(_) => Vec::new(),
        }
    }
}

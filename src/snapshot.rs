//! Snapshot entries and detailed events handed to renderers and exporters

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::stats::{DurationStats, DurationUnit};

/// Secondary outcome counters carried by a snapshot entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcomes {
    /// Paired intervals have no secondary counter
    None,
    /// Exceptions thrown by a generator
    Failures { failures: u64 },
    /// Completed and canceled workspace blocks
    Blocks { completed: u64, canceled: u64 },
}

impl Outcomes {
    pub fn failures(&self) -> u64 {
        match self {
            Outcomes::Failures { failures } => *failures,
            _ => 0,
        }
    }

    pub fn completed(&self) -> u64 {
        match self {
            Outcomes::Blocks { completed, .. } => *completed,
            _ => 0,
        }
    }

    pub fn canceled(&self) -> u64 {
        match self {
            Outcomes::Blocks { canceled, .. } => *canceled,
            _ => 0,
        }
    }
}

/// Immutable projection of one key at the moment of the snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotEntry {
    /// Display name (resolved name, compilation spelling, or decimal id)
    pub name: String,
    #[serde(flatten)]
    pub stats: DurationStats,
    pub outcomes: Outcomes,
}

/// Class of a detailed event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventClass {
    Invocation,
    Exception,
    Compilation,
}

impl std::fmt::Display for EventClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EventClass::Invocation => "Invocation",
            EventClass::Exception => "Exception",
            EventClass::Compilation => "Compilation",
        };
        f.write_str(label)
    }
}

/// One completed observation, retained for the detail export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedEvent {
    pub timestamp: DateTime<Utc>,
    pub key: String,
    pub class: EventClass,
    /// Absent for exceptions
    pub duration: Option<i64>,
    pub unit: DurationUnit,
}

impl DetailedEvent {
    pub fn duration_millis(&self) -> Option<f64> {
        self.duration.map(|d| self.unit.to_millis(d as f64))
    }
}

/// Sort detailed events by timestamp, oldest first
///
/// The aggregators return their logs in unspecified order; exporters call this.
pub fn sort_by_timestamp(events: &mut [DetailedEvent]) {
    events.sort_by_key(|e| e.timestamp);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let failures = Outcomes::Failures { failures: 3 };
        assert_eq!(failures.failures(), 3);
        assert_eq!(failures.completed(), 0);

        let blocks = Outcomes::Blocks {
            completed: 4,
            canceled: 1,
        };
        assert_eq!(blocks.completed(), 4);
        assert_eq!(blocks.canceled(), 1);
        assert_eq!(blocks.failures(), 0);

        assert_eq!(Outcomes::None.canceled(), 0);
    }

    #[test]
    fn test_sort_by_timestamp() {
        let at = |ms| DateTime::<Utc>::from_timestamp_millis(ms).unwrap();
        let event = |ms, key: &str| DetailedEvent {
            timestamp: at(ms),
            key: key.to_string(),
            class: EventClass::Invocation,
            duration: Some(1),
            unit: DurationUnit::Ticks,
        };

        let mut events = vec![event(30, "c"), event(10, "a"), event(20, "b")];
        sort_by_timestamp(&mut events);

        let keys: Vec<_> = events.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_snapshot_entry_serializes_flat_stats() {
        let entry = SnapshotEntry {
            name: "Gen".to_string(),
            stats: DurationStats::from_samples(&[10, 20], DurationUnit::Ticks),
            outcomes: Outcomes::Failures { failures: 1 },
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["name"], "Gen");
        assert_eq!(json["count"], 2);
        assert_eq!(json["total"], 30);
        assert_eq!(json["outcomes"]["failures"], 1);
    }
}

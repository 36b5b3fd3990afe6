//! Invocation aggregator for independent duration samples
//!
//! Source generator run-time events arrive as self-contained (name, elapsed
//! ticks) pairs; exceptions arrive separately and only bump a counter.
//!
//! The key map is a `DashMap`, so writers for unrelated keys never contend on a
//! global lock. Each key owns its own mutex covering samples, the failure
//! counter and its slice of the detailed event log.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::snapshot::{DetailedEvent, EventClass, Outcomes, SnapshotEntry};
use crate::stats::{DurationStats, DurationUnit};

/// Unit of invocation samples
pub const INVOCATION_UNIT: DurationUnit = DurationUnit::Ticks;

#[derive(Debug, Default)]
struct InvocationRecord {
    samples: Vec<i64>,
    failures: u64,
    events: Vec<DetailedEvent>,
}

/// Accumulates invocation durations and failure counts per name
#[derive(Debug, Default)]
pub struct InvocationAggregator {
    keys: DashMap<String, Arc<Mutex<InvocationRecord>>>,
}

impl InvocationAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &str) -> Arc<Mutex<InvocationRecord>> {
        if let Some(existing) = self.keys.get(key) {
            return Arc::clone(existing.value());
        }
        Arc::clone(self.keys.entry(key.to_string()).or_default().value())
    }

    /// Record one invocation of `key` lasting `duration_ticks`
    ///
    /// Zero and negative durations are stored unchanged.
    pub fn record_invocation(&self, key: &str, duration_ticks: i64, timestamp: DateTime<Utc>) {
        let slot = self.slot(key);
        let mut record = slot.lock();
        record.samples.push(duration_ticks);
        record.events.push(DetailedEvent {
            timestamp,
            key: key.to_string(),
            class: EventClass::Invocation,
            duration: Some(duration_ticks),
            unit: INVOCATION_UNIT,
        });
    }

    /// Record one failure of `key`; creates the key if it was never seen
    pub fn record_failure(&self, key: &str, timestamp: DateTime<Utc>) {
        let slot = self.slot(key);
        let mut record = slot.lock();
        record.failures += 1;
        record.events.push(DetailedEvent {
            timestamp,
            key: key.to_string(),
            class: EventClass::Exception,
            duration: None,
            unit: INVOCATION_UNIT,
        });
    }

    /// One entry per known key, in unspecified order
    ///
    /// Each entry is computed from a coherent copy of that key's samples. The
    /// walk is not a barrier across keys: entries for different keys may reflect
    /// slightly different moments when writers are active.
    pub fn snapshot(&self) -> Vec<SnapshotEntry> {
        let slots: Vec<(String, Arc<Mutex<InvocationRecord>>)> = self
            .keys
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        slots
            .into_iter()
            .map(|(name, slot)| {
                let (samples, failures) = {
                    let record = slot.lock();
                    (record.samples.clone(), record.failures)
                };
                SnapshotEntry {
                    name,
                    stats: DurationStats::from_samples(&samples, INVOCATION_UNIT),
                    outcomes: Outcomes::Failures { failures },
                }
            })
            .collect()
    }

    /// Every invocation and failure recorded so far, in unspecified order
    pub fn detailed_events(&self) -> Vec<DetailedEvent> {
        let slots: Vec<Arc<Mutex<InvocationRecord>>> =
            self.keys.iter().map(|entry| Arc::clone(entry.value())).collect();

        slots
            .iter()
            .flat_map(|slot| slot.lock().events.clone())
            .collect()
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}

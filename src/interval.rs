//! Interval pairing aggregator for start/stop events
//!
//! Compilation start and stop events carry only a name and a timestamp. Stops are
//! matched against the most recent unmatched start of the same name (LIFO);
//! a stop with nothing pending, or a pair whose duration is not positive, is
//! dropped without recording anything.
//!
//! Names compare case-insensitively. The spelling seen first is the one shown.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::snapshot::{DetailedEvent, EventClass, Outcomes, SnapshotEntry};
use crate::stats::{DurationStats, DurationUnit};

/// Unit of paired interval samples
pub const INTERVAL_UNIT: DurationUnit = DurationUnit::Micros;

/// Case-insensitive compilation name
#[derive(Debug, Clone)]
pub struct CompilationName(String);

impl CompilationName {
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn folded(&self) -> impl Iterator<Item = char> + '_ {
        self.0.chars().flat_map(char::to_lowercase)
    }
}

impl PartialEq for CompilationName {
    fn eq(&self, other: &Self) -> bool {
        self.folded().eq(other.folded())
    }
}

impl Eq for CompilationName {}

impl Hash for CompilationName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in self.folded() {
            c.hash(state);
        }
    }
}

#[derive(Debug)]
struct IntervalRecord {
    display_name: String,
    pending_starts: Vec<DateTime<Utc>>,
    samples: Vec<i64>,
    events: Vec<DetailedEvent>,
}

impl IntervalRecord {
    fn new(display_name: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            pending_starts: Vec::new(),
            samples: Vec::new(),
            events: Vec::new(),
        }
    }
}

/// Pairs start/stop events per name into duration samples
#[derive(Debug, Default)]
pub struct IntervalAggregator {
    keys: DashMap<CompilationName, Arc<Mutex<IntervalRecord>>>,
}

impl IntervalAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, name: &str) -> Arc<Mutex<IntervalRecord>> {
        let key = CompilationName::new(name);
        if let Some(existing) = self.keys.get(&key) {
            return Arc::clone(existing.value());
        }
        let slot = self
            .keys
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(IntervalRecord::new(name))));
        Arc::clone(slot.value())
    }

    /// Push a pending start for `name`
    pub fn record_start(&self, name: &str, timestamp: DateTime<Utc>) {
        let slot = self.slot(name);
        slot.lock().pending_starts.push(timestamp);
    }

    /// Match a stop against the latest pending start of `name`
    ///
    /// Pop and append happen under the key's lock, so each pending start is
    /// consumed by exactly one stop.
    pub fn record_stop(&self, name: &str, timestamp: DateTime<Utc>) {
        let slot = self.slot(name);
        let mut record = slot.lock();

        let Some(start) = record.pending_starts.pop() else {
            debug!(name, "stop without pending start dropped");
            return;
        };

        let duration = timestamp - start;
        let micros = duration.num_microseconds().unwrap_or(i64::MAX);
        if micros <= 0 {
            debug!(name, micros, "non-positive interval dropped");
            return;
        }

        record.samples.push(micros);
        record.events.push(DetailedEvent {
            timestamp,
            key: name.to_string(),
            class: EventClass::Compilation,
            duration: Some(micros),
            unit: INTERVAL_UNIT,
        });
    }

    /// One entry per name that has at least one matched pair
    ///
    /// Names with only pending starts or stray stops carry nothing to report and
    /// are left out. Like the other aggregators, this is not a cross-key barrier.
    pub fn snapshot(&self) -> Vec<SnapshotEntry> {
        let slots: Vec<Arc<Mutex<IntervalRecord>>> =
            self.keys.iter().map(|entry| Arc::clone(entry.value())).collect();

        slots
            .into_iter()
            .filter_map(|slot| {
                let (name, samples) = {
                    let record = slot.lock();
                    if record.samples.is_empty() {
                        return None;
                    }
                    (record.display_name.clone(), record.samples.clone())
                };
                Some(SnapshotEntry {
                    name,
                    stats: DurationStats::from_samples(&samples, INTERVAL_UNIT),
                    outcomes: Outcomes::None,
                })
            })
            .collect()
    }

    /// Every matched, positive-duration pair, in unspecified order
    pub fn detailed_events(&self) -> Vec<DetailedEvent> {
        let slots: Vec<Arc<Mutex<IntervalRecord>>> =
            self.keys.iter().map(|entry| Arc::clone(entry.value())).collect();

        slots
            .iter()
            .flat_map(|slot| slot.lock().events.clone())
            .collect()
    }

    /// Number of starts still waiting for a stop under `name`
    pub fn pending_starts(&self, name: &str) -> usize {
        self.keys
            .get(&CompilationName::new(name))
            .map(|slot| slot.lock().pending_starts.len())
            .unwrap_or(0)
    }
}

//! Identified-block aggregator for workspace operations
//!
//! Blocks are keyed by a numeric function id. Completed and canceled blocks
//! feed the same sample collection; only their counters differ. Display names
//! come from the late-bound [`NameResolver`].

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::name_table::NameResolver;
use crate::snapshot::{Outcomes, SnapshotEntry};
use crate::stats::{DurationStats, DurationUnit};

/// Unit of block samples
pub const BLOCK_UNIT: DurationUnit = DurationUnit::Millis;

#[derive(Debug, Default)]
struct BlockRecord {
    samples: Vec<i64>,
    completed: u64,
    canceled: u64,
}

#[derive(Debug, Clone, Copy)]
enum BlockOutcome {
    Completed,
    Canceled,
}

/// Accumulates block durations and outcome counts per function id
#[derive(Debug, Default)]
pub struct BlockAggregator {
    blocks: DashMap<i32, Arc<Mutex<BlockRecord>>>,
    names: NameResolver,
}

impl BlockAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, id: i32, duration_ms: i64, outcome: BlockOutcome) {
        let slot = Arc::clone(self.blocks.entry(id).or_default().value());
        let mut record = slot.lock();
        record.samples.push(duration_ms);
        match outcome {
            BlockOutcome::Completed => record.completed += 1,
            BlockOutcome::Canceled => record.canceled += 1,
        }
    }

    pub fn record_block_completed(&self, id: i32, duration_ms: i64) {
        self.record(id, duration_ms, BlockOutcome::Completed);
    }

    pub fn record_block_canceled(&self, id: i32, duration_ms: i64) {
        self.record(id, duration_ms, BlockOutcome::Canceled);
    }

    /// Replace the id to name table with one parsed from `blob`
    pub fn register_name_table(&self, blob: &str) {
        self.names.register(blob);
    }

    /// One entry per seen id, names resolved against the table current at call time
    ///
    /// Not a barrier across ids; see [`crate::invocation::InvocationAggregator::snapshot`].
    pub fn snapshot(&self) -> Vec<SnapshotEntry> {
        let names = self.names.current();
        let slots: Vec<(i32, Arc<Mutex<BlockRecord>>)> = self
            .blocks
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        slots
            .into_iter()
            .map(|(id, slot)| {
                let (samples, completed, canceled) = {
                    let record = slot.lock();
                    (record.samples.clone(), record.completed, record.canceled)
                };
                SnapshotEntry {
                    name: names.resolve(id),
                    stats: DurationStats::from_samples(&samples, BLOCK_UNIT),
                    outcomes: Outcomes::Blocks {
                        completed,
                        canceled,
                    },
                }
            })
            .collect()
    }
}

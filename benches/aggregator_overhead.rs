//! Aggregator hot path benchmark
//!
//! The event source calls `record_*` once per trace event while the live view
//! takes a snapshot every refresh. Recording must stay cheap under that load.
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench aggregator_overhead
//! ```

use camon::blocks::BlockAggregator;
use camon::interval::IntervalAggregator;
use camon::invocation::InvocationAggregator;
use camon::projector::{project, SortState};
use chrono::{DateTime, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn at_micros(micros: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_micros(micros).unwrap_or_default()
}

/// Benchmark: one invocation recorded against an existing key
fn bench_record_invocation(c: &mut Criterion) {
    let aggregator = InvocationAggregator::new();
    let mut i = 0i64;

    c.bench_function("record_invocation", |b| {
        b.iter(|| {
            aggregator.record_invocation(black_box("Bench.Generator"), i, at_micros(i));
            i += 1;
        });
    });
}

/// Benchmark: one start/stop pair
fn bench_record_interval(c: &mut Criterion) {
    let aggregator = IntervalAggregator::new();
    let mut i = 0i64;

    c.bench_function("record_interval_pair", |b| {
        b.iter(|| {
            aggregator.record_start(black_box("App"), at_micros(i));
            aggregator.record_stop(black_box("App"), at_micros(i + 250));
            i += 1;
        });
    });
}

/// Benchmark: block completions spread over a set of ids
fn bench_record_block(c: &mut Criterion) {
    let aggregator = BlockAggregator::new();
    aggregator.register_name_table("1 Solution_Open\n2 Find_References\n");
    let mut i = 0i32;

    c.bench_function("record_block_completed", |b| {
        b.iter(|| {
            aggregator.record_block_completed(black_box(i % 64), 12);
            i = i.wrapping_add(1);
        });
    });
}

/// Benchmark: snapshot plus top-50 projection with a growing number of keys
fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_and_project");

    for keys in [10usize, 100, 1000] {
        let aggregator = InvocationAggregator::new();
        for k in 0..keys {
            let name = format!("Generator{}", k);
            for i in 0..20i64 {
                aggregator.record_invocation(&name, 1_000 + i * k as i64, at_micros(i));
            }
        }

        group.bench_with_input(BenchmarkId::from_parameter(keys), &keys, |b, _| {
            b.iter(|| {
                let snapshot = aggregator.snapshot();
                black_box(project(&snapshot, SortState::default(), 50));
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_record_invocation,
    bench_record_interval,
    bench_record_block,
    bench_snapshot
);
criterion_main!(benches);

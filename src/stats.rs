//! Duration statistics shared by every aggregator
//!
//! Each aggregator keeps the raw samples of a key and recomputes count, mean,
//! nearest-rank P90 and total from a private copy on every snapshot.

use serde::Serialize;

/// Percentile shown in the live table and the exports
pub const P90_PERCENT: u64 = 90;

/// Unit of the integer samples held by an aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    /// 100 ns ticks, as reported by generator run-time events
    Ticks,
    /// Microseconds, derived from paired start/stop timestamps
    Micros,
    /// Milliseconds, as reported by workspace block events
    Millis,
}

impl DurationUnit {
    /// Convert a value expressed in this unit to milliseconds
    pub fn to_millis(self, value: f64) -> f64 {
        match self {
            DurationUnit::Ticks => value / 10_000.0,
            DurationUnit::Micros => value / 1_000.0,
            DurationUnit::Millis => value,
        }
    }
}

/// Statistics for the samples of a single key
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DurationStats {
    /// Number of samples
    pub count: u64,
    /// Arithmetic mean, 0 when there are no samples
    pub mean: f64,
    /// Nearest-rank 90th percentile
    pub p90: i64,
    /// Sum of all samples (saturating)
    pub total: i64,
    /// Unit of `mean`, `p90` and `total`
    pub unit: DurationUnit,
}

impl DurationStats {
    /// All-zero statistics for a key that has no samples yet
    pub fn empty(unit: DurationUnit) -> Self {
        Self {
            count: 0,
            mean: 0.0,
            p90: 0,
            total: 0,
            unit,
        }
    }

    /// Compute statistics from one coherent copy of a key's samples
    ///
    /// The slice is not modified; percentile selection sorts its own copy.
    pub fn from_samples(samples: &[i64], unit: DurationUnit) -> Self {
        if samples.is_empty() {
            return Self::empty(unit);
        }

        let count = samples.len() as u64;
        // The exact sum feeds the mean; only the reported total saturates
        let exact: i128 = samples.iter().map(|&duration| i128::from(duration)).sum();
        let total = exact.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64;

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        Self {
            count,
            mean: exact as f64 / count as f64,
            p90: nearest_rank(&sorted, P90_PERCENT),
            total,
            unit,
        }
    }

    pub fn mean_millis(&self) -> f64 {
        self.unit.to_millis(self.mean)
    }

    pub fn p90_millis(&self) -> f64 {
        self.unit.to_millis(self.p90 as f64)
    }

    pub fn total_millis(&self) -> f64 {
        self.unit.to_millis(self.total as f64)
    }
}

/// Nearest-rank percentile of ascending `sorted` data
///
/// Selects index `max(0, ceil(n * percent / 100) - 1)`. The rank is computed in
/// integer arithmetic so that e.g. n = 10 always lands on index 8.
pub fn nearest_rank(sorted: &[i64], percent: u64) -> i64 {
    if sorted.is_empty() {
        return 0;
    }

    let n = sorted.len() as u64;
    let rank = (n * percent).div_ceil(100);
    let index = rank.saturating_sub(1).min(n - 1) as usize;
    sorted[index]
}

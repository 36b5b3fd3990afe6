//! Sorting and truncation of snapshots for display and export
//!
//! [`project`] is the only sorting primitive; renderers consume its output as-is.
//! [`SortState`] is the column-selection state machine driven by the digit keys.

use std::cmp::Ordering;

use clap::ValueEnum;

use crate::snapshot::SnapshotEntry;

/// A sortable column of the snapshot table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Column {
    Name,
    Count,
    Mean,
    P90,
    Total,
    Failures,
    Completed,
    Canceled,
}

impl Column {
    fn compare(self, a: &SnapshotEntry, b: &SnapshotEntry) -> Ordering {
        match self {
            Column::Name => compare_ignore_case(&a.name, &b.name),
            Column::Count => a.stats.count.cmp(&b.stats.count),
            // Units agree within one snapshot
            Column::Mean => a.stats.mean.total_cmp(&b.stats.mean),
            Column::P90 => a.stats.p90.cmp(&b.stats.p90),
            Column::Total => a.stats.total.cmp(&b.stats.total),
            Column::Failures => a.outcomes.failures().cmp(&b.outcomes.failures()),
            Column::Completed => a.outcomes.completed().cmp(&b.outcomes.completed()),
            Column::Canceled => a.outcomes.canceled().cmp(&b.outcomes.canceled()),
        }
    }
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    let a = a.chars().flat_map(char::to_lowercase);
    let b = b.chars().flat_map(char::to_lowercase);
    a.cmp(b)
}

/// Current sort column and direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: Column,
    pub ascending: bool,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: Column::Total,
            ascending: false,
        }
    }
}

impl SortState {
    pub fn new(column: Column, ascending: bool) -> Self {
        Self { column, ascending }
    }

    /// Selecting the current column flips direction; any other column sorts descending
    pub fn select(self, column: Column) -> Self {
        if column == self.column {
            Self {
                column,
                ascending: !self.ascending,
            }
        } else {
            Self {
                column,
                ascending: false,
            }
        }
    }
}

/// Sort `entries` by `sort` and keep the first `limit`
///
/// Ties keep their input order. The input is not modified.
pub fn project(entries: &[SnapshotEntry], sort: SortState, limit: usize) -> Vec<SnapshotEntry> {
    let mut sorted: Vec<SnapshotEntry> = entries.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = sort.column.compare(a, b);
        if sort.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
    sorted.truncate(limit);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Outcomes;
    use crate::stats::{DurationStats, DurationUnit};

    fn entry(name: &str, samples: &[i64], failures: u64) -> SnapshotEntry {
        SnapshotEntry {
            name: name.to_string(),
            stats: DurationStats::from_samples(samples, DurationUnit::Millis),
            outcomes: Outcomes::Failures { failures },
        }
    }

    fn names(entries: &[SnapshotEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_default_state_is_total_descending() {
        let state = SortState::default();
        assert_eq!(state.column, Column::Total);
        assert!(!state.ascending);
    }

    #[test]
    fn test_select_same_column_toggles() {
        let state = SortState::default().select(Column::Total);
        assert!(state.ascending);
        let state = state.select(Column::Total);
        assert!(!state.ascending);
    }

    #[test]
    fn test_select_other_column_resets_to_descending() {
        let state = SortState::new(Column::Total, true).select(Column::Name);
        assert_eq!(state, SortState::new(Column::Name, false));
    }

    #[test]
    fn test_project_by_total_descending() {
        let entries = vec![
            entry("a", &[10], 0),
            entry("b", &[30], 0),
            entry("c", &[20], 0),
        ];
        let projected = project(&entries, SortState::default(), 10);
        assert_eq!(names(&projected), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_project_name_is_case_insensitive() {
        let entries = vec![entry("beta", &[1], 0), entry("Alpha", &[1], 0), entry("gamma", &[1], 0)];
        let projected = project(&entries, SortState::new(Column::Name, true), 10);
        assert_eq!(names(&projected), vec!["Alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_project_truncates_after_sorting() {
        let entries = vec![
            entry("a", &[1], 0),
            entry("b", &[3], 0),
            entry("c", &[2], 0),
        ];
        let projected = project(&entries, SortState::new(Column::Total, true), 2);
        assert_eq!(names(&projected), vec!["a", "c"]);

        assert!(project(&entries, SortState::default(), 0).is_empty());
    }

    #[test]
    fn test_project_by_failures_and_mean() {
        let entries = vec![entry("a", &[1, 3], 5), entry("b", &[4], 1)];
        let by_failures = project(&entries, SortState::new(Column::Failures, false), 10);
        assert_eq!(names(&by_failures), vec!["a", "b"]);
        let by_mean = project(&entries, SortState::new(Column::Mean, false), 10);
        assert_eq!(names(&by_mean), vec!["b", "a"]);
    }

    #[test]
    fn test_project_leaves_input_untouched() {
        let entries = vec![entry("z", &[1], 0), entry("a", &[2], 0)];
        let _ = project(&entries, SortState::new(Column::Name, true), 1);
        assert_eq!(names(&entries), vec!["z", "a"]);
    }
}

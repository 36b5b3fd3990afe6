//! CSV export of session summaries and detailed event logs
//!
//! Written on exit with `--save`, one summary file per session and, for kinds
//! that keep timestamps, one detail file ordered by timestamp.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;

use crate::error::Result;
use crate::session::{MonitorKind, MonitorSession};
use crate::snapshot::{sort_by_timestamp, DetailedEvent, SnapshotEntry};

/// Escape CSV field (handle commas, quotes, newlines)
pub fn escape_field(field: &str) -> String {
    // If field contains comma, quote, or newline, wrap in quotes and escape quotes
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// CSV summary formatter, one row per snapshot entry
#[derive(Debug)]
pub struct CsvSummaryOutput {
    kind: MonitorKind,
    entries: Vec<SnapshotEntry>,
}

impl CsvSummaryOutput {
    pub fn new(kind: MonitorKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
        }
    }

    pub fn add_entry(&mut self, entry: SnapshotEntry) {
        self.entries.push(entry);
    }

    fn header(&self) -> &'static str {
        match self.kind {
            MonitorKind::Generator => {
                "Generator,Invocations,AvgDurationMs,P90DurationMs,TotalDurationMs,Exceptions"
            }
            MonitorKind::Compilation => {
                "Project,Compilations,AvgDurationMs,P90DurationMs,TotalDurationMs"
            }
            MonitorKind::Workspace => {
                "Operation,Completed,Canceled,AvgDurationMs,P90DurationMs,TotalDurationMs"
            }
        }
    }

    fn format_entry(&self, entry: &SnapshotEntry) -> String {
        let timing = format!(
            "{:.3},{:.3},{:.3}",
            entry.stats.mean_millis(),
            entry.stats.p90_millis(),
            entry.stats.total_millis()
        );
        let name = escape_field(&entry.name);

        match self.kind {
            MonitorKind::Generator => format!(
                "{},{},{},{}",
                name,
                entry.stats.count,
                timing,
                entry.outcomes.failures()
            ),
            MonitorKind::Compilation => format!("{},{},{}", name, entry.stats.count, timing),
            MonitorKind::Workspace => format!(
                "{},{},{},{}",
                name,
                entry.outcomes.completed(),
                entry.outcomes.canceled(),
                timing
            ),
        }
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();

        output.push_str(self.header());
        output.push('\n');

        for entry in &self.entries {
            output.push_str(&self.format_entry(entry));
            output.push('\n');
        }

        output
    }
}

/// CSV detail formatter, one row per detailed event
#[derive(Debug)]
pub struct CsvDetailOutput {
    kind: MonitorKind,
    events: Vec<DetailedEvent>,
}

impl CsvDetailOutput {
    pub fn new(kind: MonitorKind) -> Self {
        Self {
            kind,
            events: Vec::new(),
        }
    }

    pub fn add_event(&mut self, event: DetailedEvent) {
        self.events.push(event);
    }

    fn header(&self) -> &'static str {
        match self.kind {
            MonitorKind::Compilation => "Timestamp,ProjectName,DurationMs",
            MonitorKind::Generator | MonitorKind::Workspace => {
                "Timestamp,GeneratorName,EventType,DurationTicks"
            }
        }
    }

    fn format_event(&self, event: &DetailedEvent) -> String {
        let timestamp = event.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true);
        let key = escape_field(&event.key);

        match self.kind {
            MonitorKind::Compilation => format!(
                "{},{},{:.3}",
                timestamp,
                key,
                event.duration_millis().unwrap_or(0.0)
            ),
            MonitorKind::Generator | MonitorKind::Workspace => format!(
                "{},{},{},{}",
                timestamp,
                key,
                event.class,
                event
                    .duration
                    .map(|ticks| ticks.to_string())
                    .unwrap_or_default()
            ),
        }
    }

    /// Generate CSV output, oldest event first
    pub fn to_csv(&self) -> String {
        let mut events = self.events.clone();
        sort_by_timestamp(&mut events);

        let mut output = String::new();
        output.push_str(self.header());
        output.push('\n');

        for event in &events {
            output.push_str(&self.format_event(event));
            output.push('\n');
        }

        output
    }
}

/// Summary CSV of a whole snapshot
pub fn summary_csv(kind: MonitorKind, entries: &[SnapshotEntry]) -> String {
    let mut output = CsvSummaryOutput::new(kind);
    for entry in entries {
        output.add_entry(entry.clone());
    }
    output.to_csv()
}

/// Write summary (and, where timestamps exist, detail) files for `session`
///
/// `stamp` is embedded in the file names, e.g. `20240501-100000`.
pub fn save_session(session: &MonitorSession, dir: &Path, stamp: &str) -> Result<Vec<PathBuf>> {
    let kind = session.kind();
    let mut written = Vec::new();

    let summary_path = dir.join(format!("{}-summary-{}.csv", kind.label(), stamp));
    fs::write(&summary_path, summary_csv(kind, &session.snapshot()))?;
    written.push(summary_path);

    if kind != MonitorKind::Workspace {
        let mut details = CsvDetailOutput::new(kind);
        for event in session.detailed_events() {
            details.add_event(event);
        }
        let detail_path = dir.join(format!("{}-detail-{}.csv", kind.label(), stamp));
        fs::write(&detail_path, details.to_csv())?;
        written.push(detail_path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{EventClass, Outcomes};
    use crate::stats::{DurationStats, DurationUnit};
    use chrono::{DateTime, Utc};

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(ms).unwrap()
    }

    #[test]
    fn test_escape_plain_field() {
        assert_eq!(escape_field("Plain.Name"), "Plain.Name");
    }

    #[test]
    fn test_escape_comma_quote_newline() {
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_generator_summary() {
        let entry = SnapshotEntry {
            name: "Gen".to_string(),
            stats: DurationStats::from_samples(&[10_000, 30_000], DurationUnit::Ticks),
            outcomes: Outcomes::Failures { failures: 2 },
        };
        let csv = summary_csv(MonitorKind::Generator, &[entry]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Generator,Invocations,AvgDurationMs,P90DurationMs,TotalDurationMs,Exceptions"
        );
        assert_eq!(lines[1], "Gen,2,2.000,3.000,4.000,2");
    }

    #[test]
    fn test_workspace_summary() {
        let entry = SnapshotEntry {
            name: "Solution_Load".to_string(),
            stats: DurationStats::from_samples(&[5, 15], DurationUnit::Millis),
            outcomes: Outcomes::Blocks {
                completed: 1,
                canceled: 1,
            },
        };
        let csv = summary_csv(MonitorKind::Workspace, &[entry]);
        assert!(csv.ends_with("Solution_Load,1,1,10.000,15.000,20.000\n"));
    }

    #[test]
    fn test_compilation_summary_quotes_name_with_comma() {
        let entry = SnapshotEntry {
            name: "App, Core".to_string(),
            stats: DurationStats::from_samples(&[1_500], DurationUnit::Micros),
            outcomes: Outcomes::None,
        };
        let csv = summary_csv(MonitorKind::Compilation, &[entry]);
        assert_eq!(csv.lines().nth(1).unwrap(), "\"App, Core\",1,1.500,1.500,1.500");
    }

    /// Split one CSV row, honouring quoted fields and `""` escapes
    fn split_row(row: &str) -> Vec<String> {
        let mut fields = vec![String::new()];
        let mut quoted = false;
        let mut chars = row.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '"' if quoted && chars.peek() == Some(&'"') => {
                    chars.next();
                    fields.last_mut().unwrap().push('"');
                }
                '"' => quoted = !quoted,
                ',' if !quoted => fields.push(String::new()),
                _ => fields.last_mut().unwrap().push(c),
            }
        }
        fields
    }

    #[test]
    fn test_quoted_rows_keep_header_column_count() {
        let names = ["Plain", "App, Core", "say \"hi\"", "a,\"b\",c", ","];
        for kind in [
            MonitorKind::Generator,
            MonitorKind::Compilation,
            MonitorKind::Workspace,
        ] {
            let entries: Vec<SnapshotEntry> = names
                .iter()
                .map(|name| SnapshotEntry {
                    name: name.to_string(),
                    stats: DurationStats::from_samples(&[1_000], DurationUnit::Millis),
                    outcomes: Outcomes::None,
                })
                .collect();

            let csv = summary_csv(kind, &entries);
            let mut lines = csv.lines();
            let columns = split_row(lines.next().unwrap()).len();
            let rows: Vec<Vec<String>> = lines.map(split_row).collect();

            assert_eq!(rows.len(), names.len());
            for (row, name) in rows.iter().zip(names) {
                assert_eq!(row.len(), columns, "row for {:?} in {:?}", name, kind);
                assert_eq!(row[0], name);
            }
        }
    }

    #[test]
    fn test_details_sorted_by_timestamp() {
        let mut details = CsvDetailOutput::new(MonitorKind::Generator);
        details.add_event(DetailedEvent {
            timestamp: at(2_000),
            key: "B".to_string(),
            class: EventClass::Exception,
            duration: None,
            unit: DurationUnit::Ticks,
        });
        details.add_event(DetailedEvent {
            timestamp: at(1_000),
            key: "A".to_string(),
            class: EventClass::Invocation,
            duration: Some(42),
            unit: DurationUnit::Ticks,
        });

        let csv = details.to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Timestamp,GeneratorName,EventType,DurationTicks");
        assert_eq!(lines[1], "1970-01-01T00:00:01.000000Z,A,Invocation,42");
        assert_eq!(lines[2], "1970-01-01T00:00:02.000000Z,B,Exception,");
    }

    #[test]
    fn test_compilation_details() {
        let mut details = CsvDetailOutput::new(MonitorKind::Compilation);
        details.add_event(DetailedEvent {
            timestamp: at(0),
            key: "App".to_string(),
            class: EventClass::Compilation,
            duration: Some(2_250),
            unit: DurationUnit::Micros,
        });
        let csv = details.to_csv();
        assert_eq!(
            csv,
            "Timestamp,ProjectName,DurationMs\n1970-01-01T00:00:00.000000Z,App,2.250\n"
        );
    }
}

//! Plain-text rendering of a session snapshot
//!
//! Used for the live view and for `--once --format text`. Sorting and the
//! top-N cut come from [`crate::projector::project`].

use crate::projector::{project, Column, SortState};
use crate::session::MonitorKind;
use crate::snapshot::SnapshotEntry;

const ASCENDING_INDICATOR: &str = " ▲";
const DESCENDING_INDICATOR: &str = " ▼";
const NAME_WIDTH_CAP: usize = 60;
const NUMBER_WIDTH: usize = 16;

/// Human-readable duration: `μs` below 1 ms, `ms` below 1 s, `s` below 1 min, else `m:ss.fff`
///
/// The bucket is chosen after rounding to its displayed precision, so a value
/// that rounds up to the next unit is shown in that unit.
pub fn format_duration(millis: f64) -> String {
    let micros = (millis * 1_000.0).round();
    if micros < 1_000.0 {
        return format!("{:.0} μs", micros);
    }

    let tenths = (millis * 10.0).round();
    if tenths < 10_000.0 {
        return format!("{:.1} ms", tenths / 10.0);
    }

    let centis = (millis / 10.0).round();
    if centis < 6_000.0 {
        return format!("{:.2} s", centis / 100.0);
    }

    let total_ms = millis.round() as u64;
    format!(
        "{}:{:02}.{:03}",
        total_ms / 60_000,
        (total_ms % 60_000) / 1_000,
        total_ms % 1_000
    )
}

fn title(kind: MonitorKind) -> &'static str {
    match kind {
        MonitorKind::Generator => "Source Generator Performance",
        MonitorKind::Compilation => "Server Compilation Performance",
        MonitorKind::Workspace => "Roslyn Workspace Operations",
    }
}

fn waiting_message(kind: MonitorKind) -> &'static str {
    match kind {
        MonitorKind::Generator => "Waiting for generator events…",
        MonitorKind::Compilation => "Waiting for compilation events…",
        MonitorKind::Workspace => "Waiting for workspace events…",
    }
}

fn header(kind: MonitorKind, column: Column) -> &'static str {
    match column {
        Column::Name => match kind {
            MonitorKind::Generator => "Generator",
            MonitorKind::Compilation => "Compilation",
            MonitorKind::Workspace => "Operation",
        },
        Column::Count => match kind {
            MonitorKind::Generator => "Invocations",
            _ => "Count",
        },
        Column::Mean => "Avg Duration",
        Column::P90 => "P90 Duration",
        Column::Total => "Total Duration",
        Column::Failures => "Exceptions",
        Column::Completed => "Completed",
        Column::Canceled => "Canceled",
    }
}

fn cell(column: Column, entry: &SnapshotEntry) -> String {
    match column {
        Column::Name => entry.name.clone(),
        Column::Count => entry.stats.count.to_string(),
        Column::Mean => format_duration(entry.stats.mean_millis()),
        Column::P90 => format_duration(entry.stats.p90_millis()),
        Column::Total => format_duration(entry.stats.total_millis()),
        Column::Failures => entry.outcomes.failures().to_string(),
        Column::Completed => entry.outcomes.completed().to_string(),
        Column::Canceled => entry.outcomes.canceled().to_string(),
    }
}

/// Columns actually displayed; the exceptions column only appears once an exception was seen
fn visible_columns(kind: MonitorKind, snapshot: &[SnapshotEntry]) -> Vec<Column> {
    let show_failures = snapshot.iter().any(|e| e.outcomes.failures() > 0);
    kind.columns()
        .iter()
        .copied()
        .filter(|&c| c != Column::Failures || show_failures)
        .collect()
}

fn truncate_name(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        name.to_string()
    } else {
        let kept: String = name.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

/// Render `snapshot` as a table of at most `top` rows sorted by `sort`
pub fn render_table(
    kind: MonitorKind,
    snapshot: &[SnapshotEntry],
    sort: SortState,
    top: usize,
) -> String {
    let columns = visible_columns(kind, snapshot);
    let rows = project(snapshot, sort, top);

    let headers: Vec<String> = columns
        .iter()
        .map(|&column| {
            let mut text = header(kind, column).to_string();
            if column == sort.column {
                text.push_str(if sort.ascending {
                    ASCENDING_INDICATOR
                } else {
                    DESCENDING_INDICATOR
                });
            }
            text
        })
        .collect();

    let name_width = rows
        .iter()
        .map(|e| e.name.chars().count())
        .chain(std::iter::once(headers[0].chars().count()))
        .chain(std::iter::once(waiting_message(kind).chars().count()).filter(|_| rows.is_empty()))
        .max()
        .unwrap_or(0)
        .min(NAME_WIDTH_CAP);

    let format_line = |cells: &[String]| -> String {
        let mut line = String::new();
        for (i, text) in cells.iter().enumerate() {
            if i == 0 {
                line.push_str(&format!("{:<width$}", truncate_name(text, name_width), width = name_width));
            } else {
                line.push_str(&format!(" {:>width$}", text, width = NUMBER_WIDTH));
            }
        }
        line.trim_end().to_string()
    };

    let rule = "─".repeat(name_width + (NUMBER_WIDTH + 1) * (columns.len() - 1));
    let mut lines = vec![title(kind).to_string(), rule.clone(), format_line(&headers), rule.clone()];

    if rows.is_empty() {
        lines.push(waiting_message(kind).to_string());
    }
    for entry in &rows {
        let cells: Vec<String> = columns.iter().map(|&column| cell(column, entry)).collect();
        lines.push(format_line(&cells));
    }

    lines.push(rule);
    lines.push(format!(
        "Press 1-{} to sort by column • q to exit",
        kind.columns().len()
    ));
    lines.join("\n")
}

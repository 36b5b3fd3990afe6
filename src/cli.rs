//! CLI argument parsing for camon

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::projector::Column;
use crate::session::MonitorKind;

/// Output format for `--once`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table (default)
    Text,
    /// JSON array of snapshot entries
    Json,
    /// CSV summary
    Csv,
}

/// What to monitor
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorCommand {
    /// Source generator invocations and exceptions (default)
    Generator,
    /// Server compilations, paired from start/stop events
    Compilation,
    /// Workspace operation blocks
    Workspace,
}

impl From<MonitorCommand> for MonitorKind {
    fn from(command: MonitorCommand) -> Self {
        match command {
            MonitorCommand::Generator => MonitorKind::Generator,
            MonitorCommand::Compilation => MonitorKind::Compilation,
            MonitorCommand::Workspace => MonitorKind::Workspace,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "camon")]
#[command(version)]
#[command(about = "Live performance monitor for compiler and workspace trace events", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<MonitorCommand>,

    /// Number of rows to display
    #[arg(long = "top", value_name = "N", default_value = "50", global = true)]
    pub top: usize,

    /// Trace file in JSON Lines format ("-" or omitted reads stdin)
    #[arg(short = 'i', long = "input", value_name = "FILE", global = true)]
    pub input: Option<PathBuf>,

    /// Only record events whose payload matches (e.g., -e name=MyGenerator or -e name=/^Microsoft/)
    #[arg(short = 'e', long = "filter", value_name = "EXPR", global = true)]
    pub filter: Vec<String>,

    /// Initial sort column
    #[arg(long = "sort", value_enum, default_value = "total", global = true)]
    pub sort: Column,

    /// Sort the initial column ascending instead of descending
    #[arg(long = "ascending", global = true)]
    pub ascending: bool,

    /// Live view refresh interval in milliseconds (default depends on the monitor)
    #[arg(long = "refresh-ms", value_name = "MS", global = true)]
    pub refresh_ms: Option<u64>,

    /// Read the whole input, print one table and exit
    #[arg(long = "once", global = true)]
    pub once: bool,

    /// Output format for --once
    #[arg(long = "format", value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Write summary and detail CSV files on exit
    #[arg(long = "save", global = true)]
    pub save: bool,

    /// Directory for files written by --save
    #[arg(
        long = "output-dir",
        value_name = "DIR",
        default_value = ".",
        global = true
    )]
    pub output_dir: PathBuf,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug", global = true)]
    pub debug: bool,
}

impl Cli {
    /// Monitor selected by the subcommand; generator when none is given
    pub fn kind(&self) -> MonitorKind {
        self.command
            .map(MonitorKind::from)
            .unwrap_or(MonitorKind::Generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_generator() {
        let cli = Cli::parse_from(["camon"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.kind(), MonitorKind::Generator);
        assert_eq!(cli.top, 50);
        assert_eq!(cli.sort, Column::Total);
        assert!(!cli.ascending);
        assert!(!cli.once);
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn test_cli_subcommands() {
        assert_eq!(
            Cli::parse_from(["camon", "compilation"]).kind(),
            MonitorKind::Compilation
        );
        assert_eq!(
            Cli::parse_from(["camon", "workspace"]).kind(),
            MonitorKind::Workspace
        );
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["camon", "workspace", "--top", "5", "--once"]);
        assert_eq!(cli.top, 5);
        assert!(cli.once);
    }

    #[test]
    fn test_cli_repeated_filters() {
        let cli = Cli::parse_from(["camon", "-e", "name=A", "-e", "name=/b/"]);
        assert_eq!(cli.filter, vec!["name=A", "name=/b/"]);
    }

    #[test]
    fn test_cli_sort_column() {
        let cli = Cli::parse_from(["camon", "--sort", "p90", "--ascending"]);
        assert_eq!(cli.sort, Column::P90);
        assert!(cli.ascending);
    }

    #[test]
    fn test_cli_format_and_save() {
        let cli = Cli::parse_from([
            "camon",
            "--format",
            "json",
            "--save",
            "--output-dir",
            "/tmp/out",
        ]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.save);
        assert_eq!(cli.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_cli_input_and_refresh() {
        let cli = Cli::parse_from(["camon", "-i", "trace.jsonl", "--refresh-ms", "250"]);
        assert_eq!(cli.input, Some(PathBuf::from("trace.jsonl")));
        assert_eq!(cli.refresh_ms, Some(250));
    }

    #[test]
    fn test_cli_rejects_unknown_sort_column() {
        assert!(Cli::try_parse_from(["camon", "--sort", "bogus"]).is_err());
    }
}

//! Runtime configuration resolved from the command line

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};

use crate::cli::{Cli, OutputFormat};
use crate::filter::EventFilter;
use crate::projector::SortState;
use crate::session::MonitorKind;

/// Everything a monitoring run needs, validated
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub kind: MonitorKind,
    pub top: usize,
    pub refresh: Duration,
    pub sort: SortState,
    pub filter: EventFilter,
    /// `None` reads stdin
    pub input: Option<PathBuf>,
    pub once: bool,
    pub format: OutputFormat,
    pub save: bool,
    pub output_dir: PathBuf,
}

impl MonitorConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let kind = cli.kind();

        if cli.top == 0 {
            bail!("Invalid value for --top: 0 (must be >= 1)");
        }

        if !kind.supports(cli.sort) {
            bail!(
                "Column '{:?}' is not shown by the {} monitor",
                cli.sort,
                kind
            );
        }

        let refresh = match cli.refresh_ms {
            Some(0) => bail!("Invalid value for --refresh-ms: 0 (must be >= 1)"),
            Some(ms) => Duration::from_millis(ms),
            None => kind.default_refresh(),
        };

        let input = cli
            .input
            .clone()
            .filter(|path| path.as_path() != Path::new("-"));

        Ok(Self {
            kind,
            top: cli.top,
            refresh,
            sort: SortState::new(cli.sort, cli.ascending),
            filter: EventFilter::from_exprs(&cli.filter)?,
            input,
            once: cli.once,
            format: cli.format,
            save: cli.save,
            output_dir: cli.output_dir.clone(),
        })
    }
}

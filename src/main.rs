use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use camon::{
    cli::{Cli, OutputFormat},
    config::MonitorConfig,
    csv_output, live,
    projector::project,
    replay::{self, ReplayHandle},
    session::MonitorSession,
    table,
};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// How long to wait for the reader thread after the live view closes
const REPLAY_GRACE: Duration = Duration::from_millis(200);

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn open_input(config: &MonitorConfig) -> Result<Box<dyn BufRead + Send>> {
    match &config.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open trace file {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Print the whole input as a single report
fn print_once(session: &MonitorSession, config: &MonitorConfig) -> Result<()> {
    let snapshot = session.live_snapshot();
    match config.format {
        OutputFormat::Text => {
            println!(
                "{}",
                table::render_table(config.kind, &snapshot, config.sort, config.top)
            );
        }
        OutputFormat::Json => {
            let rows = project(&snapshot, config.sort, config.top);
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Csv => {
            let rows = project(&snapshot, config.sort, config.top);
            print!("{}", csv_output::summary_csv(config.kind, &rows));
        }
    }
    Ok(())
}

fn finish_replay(replay: ReplayHandle, once: bool) -> Result<()> {
    if once {
        replay.join()?;
        return Ok(());
    }
    match replay.stop(REPLAY_GRACE) {
        Some(result) => {
            result?;
        }
        None => warn!("trace reader still blocked on input at exit"),
    }
    Ok(())
}

fn save(session: &MonitorSession, config: &MonitorConfig) -> Result<()> {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
    let written = csv_output::save_session(session, &config.output_dir, &stamp)
        .with_context(|| format!("Failed to write CSV files to {}", config.output_dir.display()))?;
    for path in written {
        println!("Saved: {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = MonitorConfig::from_cli(&args)?;
    info!(kind = %config.kind, top = config.top, "starting monitor");

    let session = Arc::new(MonitorSession::new(config.kind));
    let input = open_input(&config)?;
    let replay = replay::spawn_replay(input, Arc::clone(&session), config.filter.clone());

    if config.once {
        finish_replay(replay, true)?;
        print_once(&session, &config)?;
    } else {
        let result = live::run_live(&session, &config);
        finish_replay(replay, false)?;
        result?;
    }

    if config.save {
        save(&session, &config)?;
    }

    Ok(())
}

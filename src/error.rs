//! Error type for session dispatch, replay and export

use thiserror::Error;

use crate::session::MonitorKind;

/// Errors surfaced to callers of the monitor library
///
/// Anomalies inside the trace stream itself (stray stops, malformed definition
/// lines, negative intervals) are never errors; they are dropped and logged.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("{event} events cannot be recorded by a {kind} session")]
    UnsupportedEvent {
        kind: MonitorKind,
        event: &'static str,
    },

    #[error("Invalid trace line: {0}")]
    InvalidTraceLine(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

//! Trace replay: the event source feeding a session from JSON Lines
//!
//! The reader runs on its own thread and shares nothing with the renderer but
//! the session. It stops at end of input or when cancelled; cancellation is
//! checked between lines.

use std::io::BufRead;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::filter::EventFilter;
use crate::session::MonitorSession;
use crate::trace_event::TraceEvent;

/// Counters describing one replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Events recorded by the session
    pub dispatched: u64,
    /// Events rejected by the payload filter
    pub filtered: u64,
    /// Events meant for another kind of session
    pub other_kind: u64,
    /// Lines that were not valid trace events
    pub malformed: u64,
}

/// Feed every line of `reader` into `session` until end of input or cancellation
pub fn replay_reader<R: BufRead>(
    mut reader: R,
    session: &MonitorSession,
    filter: &EventFilter,
    cancel: &Receiver<()>,
) -> Result<ReplayStats> {
    let mut stats = ReplayStats::default();
    let mut buf = Vec::new();
    let mut index = 0usize;

    loop {
        match cancel.try_recv() {
            Ok(()) => {
                debug!(line = index + 1, "replay cancelled");
                break;
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {}
        }

        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        index += 1;

        // Undecodable bytes are malformed input, not an I/O failure
        let Ok(line) = std::str::from_utf8(&buf) else {
            warn!(line = index, "trace line is not valid UTF-8, skipped");
            stats.malformed += 1;
            continue;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event = match TraceEvent::parse_line(line) {
            Ok(event) => event,
            Err(error) => {
                warn!(line = index, %error, "malformed trace line skipped");
                stats.malformed += 1;
                continue;
            }
        };

        if event.kind() != session.kind() {
            stats.other_kind += 1;
            continue;
        }

        if !filter.matches(&event) {
            stats.filtered += 1;
            continue;
        }

        session.dispatch(&event)?;
        stats.dispatched += 1;
    }

    info!(
        dispatched = stats.dispatched,
        filtered = stats.filtered,
        other_kind = stats.other_kind,
        malformed = stats.malformed,
        "replay finished"
    );
    Ok(stats)
}

/// A replay running on a background thread
pub struct ReplayHandle {
    handle: JoinHandle<Result<ReplayStats>>,
    cancel: Sender<()>,
}

/// Start replaying `reader` into `session` on a new thread
pub fn spawn_replay<R>(reader: R, session: Arc<MonitorSession>, filter: EventFilter) -> ReplayHandle
where
    R: BufRead + Send + 'static,
{
    let (cancel, cancelled) = channel::bounded(1);
    let handle = thread::spawn(move || replay_reader(reader, &session, &filter, &cancelled));
    ReplayHandle { handle, cancel }
}

impl ReplayHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Ask the replay to stop after the current line
    pub fn cancel(&self) {
        let _ = self.cancel.try_send(());
    }

    /// Wait for the replay to reach the end of its input
    pub fn join(self) -> Result<ReplayStats> {
        match self.handle.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// Cancel and wait up to `grace` for the thread to exit
    ///
    /// Returns `None` when the reader is still blocked on input (e.g. an idle
    /// stdin); the thread is then left to die with the process.
    pub fn stop(self, grace: Duration) -> Option<Result<ReplayStats>> {
        self.cancel();
        let deadline = Instant::now() + grace;
        while !self.is_finished() {
            if Instant::now() >= deadline {
                return None;
            }
            thread::sleep(Duration::from_millis(10));
        }
        Some(self.join())
    }
}

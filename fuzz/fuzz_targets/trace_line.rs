#![no_main]

use camon::filter::EventFilter;
use camon::session::MonitorSession;
use camon::trace_event::TraceEvent;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(event) = TraceEvent::parse_line(line) else {
        return;
    };

    // Any parsed event can be routed to the session of its own kind
    let session = MonitorSession::new(event.kind());
    if EventFilter::all().matches(&event) {
        session
            .dispatch(&event)
            .expect("event of matching kind dispatched");
    }
    let _ = session.snapshot();
});

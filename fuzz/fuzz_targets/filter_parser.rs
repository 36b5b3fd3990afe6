#![no_main]

use camon::filter::EventFilter;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Malformed expressions must be rejected, never panic
    if let Ok(input) = std::str::from_utf8(data) {
        let exprs: Vec<&str> = input.split('\n').collect();
        let _ = EventFilter::from_exprs(&exprs);
    }
});

#![no_main]

use camon::name_table::NameTable;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(blob) = std::str::from_utf8(data) {
        let table = NameTable::parse(blob);
        assert!(table.len() <= blob.lines().count());
    }
});

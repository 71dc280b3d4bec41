#![no_main]

use curfew::credentials::parse_userlist;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Every input parses; invalid lines are skipped
    let _ = parse_userlist(data);
});

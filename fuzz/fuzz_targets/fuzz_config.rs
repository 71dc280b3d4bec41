#![no_main]

use curfew::Config;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let input = match std::str::from_utf8(data) {
        Ok(s) => s,
        Err(_) => return,
    };

    // Exercise TOML config parsing and list resolution; errors are fine
    if let Ok(config) = Config::parse(input) {
        let _ = config.lists.resolve();
        let _ = config.logging.decisions();
    }
});

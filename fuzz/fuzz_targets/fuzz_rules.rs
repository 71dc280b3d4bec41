#![no_main]

use curfew::schedule::parse_rules;
use curfew::ScheduleTime;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Split input into a rule file and a host at the first null byte
    let split = data.iter().position(|&b| b == 0);
    let (rules_bytes, host_bytes) = match split {
        Some(pos) => (&data[..pos], &data[pos + 1..]),
        None => (data, &[] as &[u8]),
    };

    let host = match std::str::from_utf8(host_bytes) {
        Ok(s) => s,
        Err(_) => return,
    };

    // Parse errors are fine; evaluating parsed rules must not panic
    if let Ok(rules) = parse_rules(rules_bytes) {
        let at = ScheduleTime {
            minute: 30,
            hour: 14,
            day_of_month: 15,
            month: 5,
            day_of_week: 3,
        };
        for rule in &rules {
            let _ = rule.matches(&at, host);
            let _ = rule.to_string();
        }
    }
});

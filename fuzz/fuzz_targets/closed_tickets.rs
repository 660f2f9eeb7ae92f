#![no_main]

use libfuzzer_sys::fuzz_target;
use tickview_core::nav::ClosedTickets;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let Ok(closed) = ClosedTickets::from_value(&value) else {
        return;
    };
    let ranges = closed.ranges();
    let disjoint = ranges
        .windows(2)
        .all(|w| w[0].0.saturating_add(w[0].1) < w[1].0);
    for id in [0, 1, 42, u64::MAX] {
        let found = closed.contains(id);
        if disjoint {
            let linear = ranges
                .iter()
                .any(|&(start, count)| start <= id && id <= start.saturating_add(count));
            assert_eq!(found, linear);
        }
    }
});

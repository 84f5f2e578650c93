#![no_main]
use chrono::NaiveDate;
use condmon_core::process_log::parse_snapshot;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The log is foreign text that may be half-written; any content must
    // yield a snapshot, never a panic.
    let Some(as_of) = NaiveDate::from_ymd_opt(2024, 5, 2).and_then(|d| d.and_hms_opt(9, 30, 0))
    else {
        return;
    };
    let text = String::from_utf8_lossy(data);
    for staleness in [0, 10, u64::MAX] {
        let snap = parse_snapshot(&text, as_of, staleness);
        if let Some(v) = snap.values() {
            assert!(v.concentration.is_finite());
            assert!(v.volume.is_finite());
        }
    }
});

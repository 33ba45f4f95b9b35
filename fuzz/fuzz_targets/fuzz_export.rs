#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(db) = ipdb::Database::from_bytes(data.to_vec()) else {
        return;
    };
    let Some(lang) = db.languages().first().map(|l| l.to_string()) else {
        return;
    };
    let Ok(ranges) = db.export_ranges(&lang) else {
        return;
    };

    // Every range must advance; cap the walk so huge tables stay fast
    let mut last_end: Option<u32> = None;
    for range in ranges.take(4096) {
        let Ok(range) = range else {
            break;
        };
        let start = u32::from(range.start);
        if let Some(prev) = last_end {
            assert_eq!(prev.wrapping_add(1), start);
        }
        assert!(start <= u32::from(range.end));
        last_end = Some(range.end.into());
    }
});

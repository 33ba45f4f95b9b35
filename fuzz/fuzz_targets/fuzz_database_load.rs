#![no_main]
use libfuzzer_sys::fuzz_target;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

fuzz_target!(|data: &[u8]| {
    // Garbage input must be rejected with an error, never a panic
    let Ok(db) = ipdb::Database::from_bytes(data.to_vec()) else {
        return;
    };

    let languages: Vec<String> = db.languages().iter().map(|l| l.to_string()).collect();
    for lang in &languages {
        let _ = db.lookup_ip(IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)), lang);
        let _ = db.lookup_ip(IpAddr::V4(Ipv4Addr::BROADCAST), lang);
        let _ = db.lookup_ip(IpAddr::V6(Ipv6Addr::LOCALHOST), lang);
    }
});

#![no_main]
use ipdb::{Database, DatabaseBuilder};
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

static CITY_DB: OnceLock<Database> = OnceLock::new();

fn city_db() -> &'static Database {
    CITY_DB.get_or_init(|| {
        let mut builder = DatabaseBuilder::new(&["country_name", "region_name"])
            .language("CN")
            .language("EN");
        builder.add_entry("0.0.0.0/1", &["保留地址", "", "RESERVED", ""]).unwrap();
        builder.add_entry("128.0.0.0/1", &["保留地址", "", "RESERVED", ""]).unwrap();
        builder.add_entry("1.1.1.0/24", &["中国", "广东", "China", "Guangdong"]).unwrap();
        builder.add_entry("192.168.0.0/16", &["局域网", "", "LAN", ""]).unwrap();
        builder.add_entry("8.8.8.8", &["谷歌", "", "Google", ""]).unwrap();
        builder.add_entry("2001:db8::/32", &["文档", "", "DOC", ""]).unwrap();
        builder.add_entry("fc00::/7", &["局域网", "", "LAN", ""]).unwrap();

        let bytes = builder.build().expect("Failed to build city database");
        Database::from_bytes(bytes).expect("Failed to load city database")
    })
}

fuzz_target!(|data: &[u8]| {
    let db = city_db();

    if let Ok(query) = std::str::from_utf8(data) {
        for lang in ["CN", "EN"] {
            let _ = db.lookup(query, lang);
            let _ = db.lookup_map(query, lang);
        }

        // An address followed by a language code
        if let Some((addr, lang)) = query.split_once(' ') {
            let _ = db.lookup(addr, lang);
        }
    }

    let lossy = String::from_utf8_lossy(data);
    let _ = db.lookup(&lossy, "CN");
});

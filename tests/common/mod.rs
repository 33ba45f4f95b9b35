#![allow(dead_code)]

use ipdb::DatabaseBuilder;
use std::io::Write;
use tempfile::NamedTempFile;

pub const FIELDS: [&str; 3] = ["country_name", "region_name", "isp_domain"];

/// City-style database covering the whole IPv4 space plus one IPv6 block.
///
/// Languages: CN (offset 0), EN (offset 3).
pub fn city_db() -> Vec<u8> {
    let reserved = ["保留地址", "", "", "RESERVED", "", ""];
    let fujian = ["中国", "福建", "电信", "China", "Fujian", "ChinaTelecom"];

    let mut builder = DatabaseBuilder::new(&FIELDS)
        .language("CN")
        .language("EN")
        .build_time(1_700_000_000);
    builder.add_entry("0.0.0.0/1", &reserved).unwrap();
    builder.add_entry("128.0.0.0/1", &reserved).unwrap();
    builder.add_entry("1.0.1.0/24", &fujian).unwrap();
    builder.add_entry("1.0.2.0/23", &fujian).unwrap();
    builder
        .add_entry("1.1.1.0/24", &["中国", "广东", "", "China", "Guangdong", ""])
        .unwrap();
    builder
        .add_entry("8.8.8.0/24", &["GOOGLE.COM", "", "", "GOOGLE.COM", "", ""])
        .unwrap();
    builder
        .add_entry("8.8.8.8", &["谷歌", "", "", "Google DNS", "", ""])
        .unwrap();
    builder
        .add_entry(
            "2001:250::/32",
            &["中国", "北京", "教育网", "China", "Beijing", "CERNET"],
        )
        .unwrap();
    builder.build().unwrap()
}

/// Same as [`city_db`] but declaring IPv4 only.
pub fn ipv4_only_db() -> Vec<u8> {
    let mut builder = DatabaseBuilder::new(&["country"])
        .language("CN")
        .ip_version(ipdb::ipdb::IPV4);
    builder.add_entry("0.0.0.0/1", &["A"]).unwrap();
    builder.add_entry("128.0.0.0/1", &["B"]).unwrap();
    builder.add_entry("2001::/16", &["C"]).unwrap();
    builder.build().unwrap()
}

/// Frame raw metadata JSON and payload into a file image.
pub fn frame(meta: &str, payload: &[u8]) -> Vec<u8> {
    let mut out = (meta.len() as u32).to_be_bytes().to_vec();
    out.extend_from_slice(meta.as_bytes());
    out.extend_from_slice(payload);
    out
}

/// Single-node database whose only record (`record`, length `declared_len`)
/// covers every IPv4 address.
pub fn single_record_db(fields: &[&str], languages: &str, record: &[u8], declared_len: u16) -> Vec<u8> {
    // node 0: both children -> reference 3 => payload offset 3 - 1 + 8 = 10
    let mut payload = Vec::new();
    payload.extend_from_slice(&3u32.to_be_bytes());
    payload.extend_from_slice(&3u32.to_be_bytes());
    payload.extend_from_slice(&[0, 0]);
    payload.extend_from_slice(&declared_len.to_be_bytes());
    payload.extend_from_slice(record);

    let fields_json: Vec<String> = fields.iter().map(|f| format!("\"{}\"", f)).collect();
    let meta = format!(
        r#"{{"build":0,"ip_version":1,"languages":{},"node_count":1,"total_size":{},"fields":[{}]}}"#,
        languages,
        payload.len(),
        fields_json.join(",")
    );
    frame(&meta, &payload)
}

pub fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

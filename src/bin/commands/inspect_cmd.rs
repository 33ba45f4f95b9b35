use anyhow::Result;
use serde_json::json;
use std::path::PathBuf;

use crate::cli_utils::{format_build_time, open_database};

pub fn cmd_inspect(database: PathBuf, json_output: bool, in_memory: bool) -> Result<()> {
    let db = open_database(&database, in_memory)?;
    let meta = db.metadata();

    if json_output {
        let output = json!({
            "file": database.display().to_string(),
            "size": db.size(),
            "build": meta.build,
            "ipv4": db.is_ipv4_supported(),
            "ipv6": db.is_ipv6_supported(),
            "node_count": meta.node_count,
            "languages": db.languages(),
            "fields": db.fields(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let yes_no = |b: bool| if b { "✓" } else { "✗" };

    println!("Database:   {}", database.display());
    println!("Size:       {} bytes", db.size());
    println!(
        "Build time: {} ({})",
        format_build_time(db.build_time()),
        meta.build
    );
    println!("Node count: {}", meta.node_count);
    println!();
    println!("Capabilities:");
    println!("  IPv4 lookups:  {}", yes_no(db.is_ipv4_supported()));
    println!("  IPv6 lookups:  {}", yes_no(db.is_ipv6_supported()));
    println!();
    println!("Languages:");
    for code in db.languages() {
        println!("  {} (offset {})", code, meta.languages[code]);
    }
    println!();
    println!("Fields:     {}", db.fields().join(", "));

    Ok(())
}

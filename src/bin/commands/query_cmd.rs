use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::cli_utils::open_database;

pub fn cmd_query(
    database: PathBuf,
    ip: String,
    language: String,
    json_output: bool,
    in_memory: bool,
) -> Result<()> {
    let db = open_database(&database, in_memory)?;

    if json_output {
        let map = db
            .lookup_map(&ip, &language)
            .with_context(|| format!("Query failed for: {}", ip))?;
        println!("{}", serde_json::to_string_pretty(&map)?);
    } else {
        let row = db
            .lookup(&ip, &language)
            .with_context(|| format!("Query failed for: {}", ip))?;
        println!("{}", row.join("\t"));
    }

    Ok(())
}

use anyhow::Result;
use ipdb::Database;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Open a database, memory-mapped unless `in_memory` is set
pub fn open_database(path: &Path, in_memory: bool) -> Result<Database> {
    let loaded = if in_memory {
        Database::open_in_memory(path)
    } else {
        Database::open(path)
    };
    let db = loaded.map_err(|e| {
        let context = if e.is_corruption() {
            format!("Not a valid IPDB database: {}", path.display())
        } else {
            format!("Failed to load database: {}", path.display())
        };
        anyhow::Error::new(e).context(context)
    })?;

    info!(
        path = %path.display(),
        size = db.size(),
        mmap = !in_memory,
        "opened database"
    );
    Ok(db)
}

/// Format a build time as `YYYY-MM-DD HH:MM:SS UTC`
pub fn format_build_time(time: SystemTime) -> String {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => format_unix_timestamp(d.as_secs()),
        Err(e) => format!("{} seconds before epoch", e.duration().as_secs()),
    }
}

/// Format a Unix timestamp as `YYYY-MM-DD HH:MM:SS UTC`
pub fn format_unix_timestamp(timestamp: u64) -> String {
    let days = timestamp / 86400;
    let remaining = timestamp % 86400;
    let hours = remaining / 3600;
    let minutes = (remaining % 3600) / 60;
    let seconds = remaining % 60;

    let (year, month, day) = days_to_ymd(days);
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
        year, month, day, hours, minutes, seconds
    )
}

// Civil-from-days (proleptic Gregorian calendar)
fn days_to_ymd(days: u64) -> (i64, u32, u32) {
    let z = days as i64 + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_unix_timestamp() {
        assert_eq!(format_unix_timestamp(0), "1970-01-01 00:00:00 UTC");
        assert_eq!(
            format_unix_timestamp(1_700_000_000),
            "2023-11-14 22:13:20 UTC"
        );
        assert_eq!(
            format_unix_timestamp(951_782_400),
            "2000-02-29 00:00:00 UTC"
        );
    }
}

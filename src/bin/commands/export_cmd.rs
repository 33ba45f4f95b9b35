use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::cli_utils::open_database;

pub fn cmd_export(
    database: PathBuf,
    language: String,
    output: Option<PathBuf>,
    in_memory: bool,
) -> Result<()> {
    let db = open_database(&database, in_memory)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst))
            .context("Failed to install Ctrl-C handler")?;
    }

    let sink: Box<dyn Write> = match &output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .has_headers(false)
        .from_writer(BufWriter::new(sink));

    let ranges = db
        .export_ranges(&language)
        .with_context(|| format!("Cannot export language {}", language))?;

    let mut count = 0usize;
    for range in ranges {
        if interrupted.load(Ordering::SeqCst) {
            writer.flush()?;
            warn!(ranges = count, "export interrupted");
            bail!("Export interrupted after {} ranges", count);
        }
        let range = range.context("Export aborted")?;
        let columns = range.columns();
        writer.write_record(columns.iter().map(|c| c.as_bytes()))?;
        count += 1;
    }
    writer.flush()?;

    info!(ranges = count, "export complete");
    Ok(())
}

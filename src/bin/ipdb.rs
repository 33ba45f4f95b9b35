mod cli_utils;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use commands::{cmd_export, cmd_inspect, cmd_query};

#[derive(Parser)]
#[command(name = "ipdb")]
#[command(
    about = "Query and export IPDB geolocation databases",
    long_about = "ipdb - Query and export IPDB geolocation databases\n\n\
    Looks up IPv4 and IPv6 addresses in an .ipdb file and prints the\n\
    matching network block with its localized fields, or exports the\n\
    whole IPv4 space as a tab-separated range list.\n\n\
    Examples:\n\
      ipdb query city.ipdb 1.1.1.1 -l CN\n\
      ipdb query city.ipdb 2001:250:200:: --json\n\
      ipdb inspect city.ipdb\n\
      ipdb export ipv4_china.ipdb -l CN -o ranges.txt"
)]
#[command(version)]
struct Cli {
    /// Read the whole file into memory instead of memory-mapping it
    #[arg(long, global = true)]
    no_mmap: bool,

    /// Verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up one IP address
    Query {
        /// Path to the database (.ipdb file)
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// IPv4 or IPv6 address
        #[arg(value_name = "IP")]
        ip: String,

        /// Language code of the returned fields
        #[arg(short, long, default_value = "CN")]
        language: String,

        /// Print the fields as a JSON object keyed by field name
        #[arg(short, long)]
        json: bool,
    },

    /// Show database metadata
    Inspect {
        /// Path to the database (.ipdb file)
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Output metadata as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Export merged IPv4 ranges as tab-separated lines
    Export {
        /// Path to the database (.ipdb file)
        #[arg(value_name = "DATABASE")]
        database: PathBuf,

        /// Language code of the exported fields
        #[arg(short, long, default_value = "CN")]
        language: String,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    // RUST_LOG wins when set; otherwise -v picks the level
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Query {
            database,
            ip,
            language,
            json,
        } => cmd_query(database, ip, language, json, cli.no_mmap),
        Commands::Inspect { database, json } => cmd_inspect(database, json, cli.no_mmap),
        Commands::Export {
            database,
            language,
            output,
        } => cmd_export(database, language, output, cli.no_mmap),
    }
}

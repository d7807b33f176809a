//! royalty-engine - Royalty Summary CLI
//!
//! Reads a quarterly royalty statement, aggregates it into per-track
//! summaries and upserts them into the royalty database.
//!
//! Subcommands:
//! - `process`: run one statement through the summary engine
//! - `show`: print stored summaries for an artist's quarter

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use royalty_common::config::{resolve_root_folder, TomlConfig};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

use royalty_engine::{
    export_failed_rows_csv, ProcessSummaryOptions, RoyaltyStore, SqliteRoyaltyStore, SummaryEngine,
};

/// Command-line arguments for royalty-engine
#[derive(Parser, Debug)]
#[command(name = "royalty-engine")]
#[command(about = "Royalty statement summary engine")]
#[command(version)]
struct Args {
    /// Root folder holding the royalty database
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, global = true, env = "ROYALTY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate a royalty statement CSV into quarterly summaries
    Process {
        #[arg(long)]
        artist_id: String,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        quarter: u8,
        /// Statement CSV file
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        upload_id: Option<String>,
        /// Write rejected rows to this CSV file
        #[arg(long)]
        failed_rows_out: Option<PathBuf>,
    },
    /// Print stored summaries as JSON
    Show {
        #[arg(long)]
        artist_id: String,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        quarter: u8,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = TomlConfig::load_or_default(args.config.as_deref());

    init_tracing(&config)?;

    info!(
        "Starting royalty-engine v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    let db_path = config.database_path(&root_folder);
    info!("Database: {}", db_path.display());

    let store = SqliteRoyaltyStore::open(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    match args.command {
        Command::Process {
            artist_id,
            year,
            quarter,
            csv,
            upload_id,
            failed_rows_out,
        } => {
            let csv_content = std::fs::read_to_string(&csv)
                .with_context(|| format!("Failed to read statement {}", csv.display()))?;

            let mut options = ProcessSummaryOptions::new(artist_id, year, quarter, csv_content);
            if let Some(upload_id) = upload_id {
                options = options.with_upload_id(upload_id);
            }

            let engine = SummaryEngine::new(Arc::new(store)).with_batch_size(config.summary.batch_size);
            let result = engine.process(options).await;

            if let Some(path) = failed_rows_out {
                write_failed_rows(&path, &result.failed_rows)?;
            }

            println!("{}", serde_json::to_string_pretty(&result)?);

            if !result.success {
                std::process::exit(1);
            }
        }
        Command::Show {
            artist_id,
            year,
            quarter,
        } => {
            let summaries = store
                .load_summaries(&artist_id, year, quarter)
                .await
                .context("Failed to load summaries")?;
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise the configured level. Logs go to the
/// configured file when set, else stderr.
fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

fn write_failed_rows(path: &Path, rows: &[royalty_engine::FailedRowRecord]) -> Result<()> {
    let export = export_failed_rows_csv(rows).context("Failed to render failed rows")?;
    std::fs::write(path, export)
        .with_context(|| format!("Failed to write failed rows to {}", path.display()))?;
    info!("Wrote {} failed rows to {}", rows.len(), path.display());
    Ok(())
}

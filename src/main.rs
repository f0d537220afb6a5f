use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tourdesk::application::engine::BookingEngine;
use tourdesk::config::EngineConfig;
use tourdesk::domain::ports::{BookingStoreBox, SubmissionStoreBox};
use tourdesk::infrastructure::in_memory::{InMemoryBookingStore, InMemorySubmissionStore};
use tourdesk::interfaces::csv::command_reader::CommandReader;
use tourdesk::interfaces::csv::report_writer::ReportWriter;
use tourdesk::interfaces::csv::runner::CommandRunner;
use tourdesk::telemetry::init_tracing;
use tracing::info;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReportFormat {
    Csv,
    Json,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input command CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Configuration file (defaults to ./tourdesk.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level or filter directive; overrides the configured one
    #[arg(long)]
    log_level: Option<String>,

    /// Report format written to stdout
    #[arg(long, value_enum, default_value_t = ReportFormat::Csv)]
    format: ReportFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = EngineConfig::load(cli.config.as_deref()).into_diagnostic()?;
    let log_level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_tracing(log_level, config.log_format);

    let (bookings, submissions) = open_stores(cli.db_path)?;
    let engine = BookingEngine::new(bookings, submissions).with_policy(config.payment_policy());

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    let summary = CommandRunner::new(&engine).run(reader.commands()).await;
    info!(
        applied = summary.applied,
        rejected = summary.rejected,
        "command script processed"
    );

    let report = engine.reconciliation_report().await.into_diagnostic()?;
    let writer = ReportWriter::new(io::stdout().lock());
    match cli.format {
        ReportFormat::Csv => writer.write_csv(&report),
        ReportFormat::Json => writer.write_json(&report),
    }
    .into_diagnostic()?;

    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(db_path: Option<PathBuf>) -> Result<(BookingStoreBox, SubmissionStoreBox)> {
    use tourdesk::infrastructure::rocksdb::RocksDBStore;

    match db_path {
        Some(db_path) => {
            let store = RocksDBStore::open(&db_path).into_diagnostic()?;
            info!(path = %db_path.display(), "using RocksDB storage");
            Ok((Box::new(store.clone()), Box::new(store)))
        }
        None => Ok(in_memory()),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(db_path: Option<PathBuf>) -> Result<(BookingStoreBox, SubmissionStoreBox)> {
    use tracing::warn;

    if let Some(db_path) = db_path {
        warn!(
            path = %db_path.display(),
            "built without the storage-rocksdb feature; falling back to in-memory storage"
        );
    }
    Ok(in_memory())
}

fn in_memory() -> (BookingStoreBox, SubmissionStoreBox) {
    (
        Box::new(InMemoryBookingStore::new()),
        Box::new(InMemorySubmissionStore::new()),
    )
}

//! Weather event ingestion.
//!
//! Streams a weather-event CSV through the aggregation pipeline and writes
//! locations, daily, monthly, and event-type aggregates to PostgreSQL,
//! plus the JSON side outputs under the output directory.
//!
//! Usage:
//!   cargo run --release --bin ingest_weather_events -- --input WeatherEvents.csv
//!   cargo run --release --bin ingest_weather_events -- --input events.csv --state IL --state WI
//!   cargo run --release --bin ingest_weather_events -- --input events.csv --max-chunks 2 --dry-run
//!
//! With `--dry-run` the aggregates are kept in memory and only the side
//! outputs are written; no database is needed.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use weather_energy_service::config::{self, DEFAULT_CONFIG_PATH};
use weather_energy_service::db;
use weather_energy_service::pipeline::{IngestOptions, IngestSummary, run_ingest_file};
use weather_energy_service::store::WeatherStore;
use weather_energy_service::store::memory::MemoryStore;
use weather_energy_service::store::postgres::PgStore;

#[derive(Parser)]
#[command(name = "ingest_weather_events", about = "Aggregate weather events for energy analysis")]
struct Cli {
    /// Weather events CSV file
    #[arg(short, long)]
    input: PathBuf,

    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Directory for JSON outputs (overrides [output].dir)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Records per read chunk (overrides [ingest].chunk_size)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Only ingest this state; repeat for several
    #[arg(long = "state")]
    states: Vec<String>,

    /// Stop after this many chunks
    #[arg(long)]
    max_chunks: Option<usize>,

    /// Aggregate in memory only; skip the database
    #[arg(long)]
    dry_run: bool,
}

fn print_summary(summary: &IngestSummary) {
    println!("\n📊 Ingestion summary");
    println!("   Rows considered:     {}", summary.total_rows);
    println!("   Chunks processed:    {}", summary.chunks_processed);
    println!("   Filtered by state:   {}", summary.filtered_rows);
    println!("   Processed:           {}", summary.processed_rows);
    println!("   Skipped:             {}", summary.skipped_rows);
    for (reason, count) in &summary.skip_reasons {
        println!("     - {:?}: {}", reason, count);
    }
    println!("   Locations:           {}", summary.locations_processed);
    println!("   Daily records:       {}", summary.daily_records_created);
    println!("   Monthly records:     {}", summary.monthly_records_created);
    println!("   Event-type records:  {}", summary.event_type_records_created);
    println!("   Elapsed:             {:.2}s", summary.elapsed_time_seconds);
    println!("   Outputs:             {}", summary.output_path);
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let cli = Cli::parse();

    println!("🌦️  Weather Event Ingestion");
    println!("===========================\n");

    let config = match config::load_config_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut options = IngestOptions::from(&config);
    if let Some(dir) = cli.output_dir {
        options.output_dir = dir;
    }
    if let Some(chunk_size) = cli.chunk_size.filter(|n| *n > 0) {
        options.chunk_size = chunk_size;
    }
    if !cli.states.is_empty() {
        options.state_filter = cli.states.iter().map(|s| s.trim().to_uppercase()).collect();
    }
    if cli.max_chunks.is_some() {
        options.max_chunks = cli.max_chunks;
    }

    println!("📂 Input: {}", cli.input.display());
    println!("   Chunk size: {}", options.chunk_size);
    if !options.state_filter.is_empty() {
        let states: Vec<&str> = options.state_filter.iter().map(String::as_str).collect();
        println!("   States: {}", states.join(", "));
    }
    if let Some(max) = options.max_chunks {
        println!("   Max chunks: {}", max);
    }

    let mut store: Box<dyn WeatherStore> = if cli.dry_run {
        println!("🧪 Dry run: aggregates kept in memory\n");
        Box::new(MemoryStore::new())
    } else {
        println!("📊 Connecting to database...");
        let client = match db::connect_with_validation() {
            Ok(client) => client,
            Err(e) => {
                eprintln!("\n❌ Database setup failed: {}\n", e);
                return ExitCode::FAILURE;
            }
        };
        match PgStore::new(client, &config.database.schema, config.ingest.write_batch_size) {
            Ok(store) => {
                println!("✓ Connected (schema '{}')\n", config.database.schema);
                Box::new(store)
            }
            Err(e) => {
                eprintln!("❌ {}", e);
                return ExitCode::FAILURE;
            }
        }
    };

    println!("🔄 Aggregating weather events...");
    match run_ingest_file(&cli.input, store.as_mut(), &options) {
        Ok(summary) => {
            print_summary(&summary);
            println!("\n✅ Ingestion complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("\n❌ Ingestion failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

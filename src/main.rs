//! Weather Energy Service - HTTP query endpoint
//!
//! Serves degree-day estimates, weather profiles, seasonal adjustment
//! factors, HVAC impact estimates, and consumption normalization from the
//! aggregates written by `ingest_weather_events`.
//!
//! Usage:
//!   cargo run --release                          # Serve on port 8080
//!   cargo run --release -- --port 9000           # Serve on another port
//!   cargo run --release -- --config other.toml   # Use another config file
//!
//! Environment:
//!   DATABASE_URL - PostgreSQL connection string
//!   RUST_LOG     - log filter (e.g. `info`, `weather_energy_service=debug`)

use std::path::PathBuf;

use clap::Parser;
use weather_energy_service::config::{self, DEFAULT_CONFIG_PATH};
use weather_energy_service::store::WeatherStore;
use weather_energy_service::store::postgres::PgStore;
use weather_energy_service::{db, endpoint};

#[derive(Parser)]
#[command(name = "weather_energy_service", about = "Weather energy query endpoint")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

fn main() {
    pretty_env_logger::init();
    let cli = Cli::parse();

    println!("🌦️  Weather Energy Service");
    println!("==========================\n");

    let config = match config::load_config_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    println!("📊 Connecting to database...");
    let client = match db::connect_and_verify(&config.database.schema) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("\n❌ Database setup failed: {}\n", e);
            std::process::exit(1);
        }
    };

    let mut store = match PgStore::new(client, &config.database.schema, config.ingest.write_batch_size) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    match store.row_counts() {
        Ok(counts) => println!(
            "✓ Schema '{}': {} locations, {} daily, {} monthly, {} event-type rows\n",
            config.database.schema, counts.locations, counts.daily, counts.monthly, counts.event_types
        ),
        Err(e) => {
            eprintln!("❌ Failed to read aggregate tables: {}", e);
            eprintln!("   Run ingest_weather_events first\n");
            std::process::exit(1);
        }
    }

    println!("🚀 Starting HTTP endpoint server...");
    if let Err(e) = endpoint::start_endpoint_server(cli.port, store) {
        eprintln!("❌ Endpoint server error: {}", e);
        std::process::exit(1);
    }
}

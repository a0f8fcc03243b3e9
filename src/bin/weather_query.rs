//! One-shot weather query for a zip code.
//!
//! Resolves the zip (and optional state) to the nearest stored location,
//! runs one query, and prints the JSON result or writes it to a file.
//!
//! Usage:
//!   cargo run --bin weather_query -- --zipcode 60601 --state IL
//!   cargo run --bin weather_query -- --zipcode 90210 --action degree-days
//!   cargo run --bin weather_query -- --zipcode 33101 --action hvac-impact --sqft 1500 -o hvac.json

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, ValueEnum};
use serde_json::{Value, json};
use weather_energy_service::config::{self, DEFAULT_CONFIG_PATH};
use weather_energy_service::db;
use weather_energy_service::model::Location;
use weather_energy_service::query::{self, DateRange, HvacParameters, QueryError};
use weather_energy_service::store::postgres::PgStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Action {
    Profile,
    DegreeDays,
    HvacImpact,
    AdjustmentFactors,
}

#[derive(Parser)]
#[command(name = "weather_query", about = "Query weather aggregates for a zip code")]
struct Cli {
    /// Zip code to look up
    #[arg(short, long)]
    zipcode: String,

    /// Two-letter state code, narrows the lookup
    #[arg(short, long)]
    state: Option<String>,

    /// Query to run
    #[arg(short, long, value_enum, default_value_t = Action::Profile)]
    action: Action,

    /// Write JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Profile year (defaults to the latest year with data)
    #[arg(long)]
    year: Option<i32>,

    /// HVAC system efficiency (0-1)
    #[arg(long, default_value_t = 0.8)]
    efficiency: f64,

    /// Conditioned floor area in square feet
    #[arg(long, default_value_t = 2000.0)]
    sqft: f64,

    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

fn run_action(store: &mut PgStore, location: &Location, cli: &Cli) -> Result<Value, QueryError> {
    let id = location.location_id.as_str();
    Ok(match cli.action {
        Action::Profile => match query::get_weather_profile(store, id, cli.year)? {
            Some(profile) => json!(profile),
            None => json!({ "error": format!("Location {} not found", id) }),
        },
        Action::DegreeDays => {
            let period = DateRange::trailing_year(Utc::now().date_naive());
            let degree_days = query::get_degree_days(store, id, &period)?;
            json!({
                "location": location,
                "degree_days": degree_days,
                "time_period": period,
            })
        }
        Action::HvacImpact => {
            let params = HvacParameters {
                efficiency: cli.efficiency,
                square_footage: cli.sqft,
            };
            let impact = query::get_weather_impact_for_hvac(store, id, params, None)?;
            json!({ "location": location, "hvac_impact": impact })
        }
        Action::AdjustmentFactors => {
            let factors = query::get_seasonal_adjustment_factors(store, id)?;
            json!({ "location": location, "adjustment_factors": factors })
        }
    })
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = match config::load_config_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut store = match db::connect_and_verify(&config.database.schema)
        .map_err(|e| e.to_string())
        .and_then(|client| {
            PgStore::new(client, &config.database.schema, config.ingest.write_batch_size).map_err(|e| e.to_string())
        }) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("❌ Database setup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let location = match query::find_nearest_location(&mut store, &cli.zipcode, cli.state.as_deref()) {
        Ok(Some(location)) => location,
        Ok(None) => {
            eprintln!("❌ No location found for zip code {}", cli.zipcode);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };
    eprintln!("📍 Using location {} ({})", location.location_id, location.state);

    let result = match run_action(&mut store, &location, &cli) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("❌ Query failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let rendered = match serde_json::to_string_pretty(&result) {
        Ok(rendered) => rendered,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };

    match &cli.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, rendered) {
                eprintln!("❌ Failed to write {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
            eprintln!("✓ Results written to {}", path.display());
        }
        None => println!("{}", rendered),
    }
    ExitCode::SUCCESS
}

/// Integration tests for the PostgreSQL aggregate store
///
/// Exercise `PgStore` against a live database in a scratch schema
/// (`weather_test`), which each test drops and recreates.
///
/// Prerequisites:
/// - PostgreSQL running with weather_db database
/// - DATABASE_URL set in .env
/// - CREATE privilege on the database for the connecting user
///
/// Run with: cargo test --test postgres_store -- --ignored --test-threads=1

use chrono::NaiveDate;
use postgres::{Client, NoTls};
use std::env;
use weather_energy_service::model::{DailyAggregate, EventTypeAggregate, Location, MonthlyAggregate};
use weather_energy_service::query::{self, DateRange, EstimationMethod};
use weather_energy_service::store::postgres::PgStore;
use weather_energy_service::store::{StoreError, WeatherStore};

const TEST_SCHEMA: &str = "weather_test";

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn setup_test_store() -> PgStore {
    dotenv::dotenv().ok();
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let mut client = Client::connect(&database_url, NoTls).expect("Failed to connect to test database");
    client
        .batch_execute(&format!("DROP SCHEMA IF EXISTS {} CASCADE", TEST_SCHEMA))
        .expect("Failed to drop test schema");

    let mut store = PgStore::new(client, TEST_SCHEMA, 2).unwrap();
    store.prepare().expect("Failed to create test tables");
    store
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn location(id: &str, zip: &str, state: &str, zone: i32) -> Location {
    Location {
        location_id: id.to_string(),
        zip_code: zip.to_string(),
        city: Some("Testville".to_string()),
        county: None,
        state: state.to_string(),
        latitude: Some(35.0),
        longitude: None,
        climate_zone: zone,
        event_frequency: 0.5,
    }
}

fn daily(id: &str, date: NaiveDate, avg_temp: f64) -> DailyAggregate {
    DailyAggregate {
        date,
        location_id: id.to_string(),
        avg_temp: Some(avg_temp),
        min_temp: Some(avg_temp),
        max_temp: Some(avg_temp),
        precipitation: 0.0,
        heating_degree_days: (65.0 - avg_temp).max(0.0),
        cooling_degree_days: (avg_temp - 65.0).max(0.0),
        severe_events: 1,
        impact_score: 2.5,
    }
}

fn monthly(id: &str, year: i32, month: i32, hdd: f64, cdd: f64) -> MonthlyAggregate {
    MonthlyAggregate {
        year,
        month,
        location_id: id.to_string(),
        avg_temp: None,
        total_heating_degree_days: hdd,
        total_cooling_degree_days: cdd,
        precipitation: 0.25,
        severe_event_days: 2,
        avg_impact_score: 3.0,
    }
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

#[test]
#[ignore] // Only run when database is available
fn test_upserts_are_idempotent() {
    let mut store = setup_test_store();
    let locations = vec![location("90210_CA", "90210", "CA", 2)];
    let days = vec![
        daily("90210_CA", date(2021, 7, 1), 80.0),
        daily("90210_CA", date(2021, 7, 2), 82.0),
        daily("90210_CA", date(2021, 7, 3), 78.0),
    ];

    for _ in 0..2 {
        store.write_locations(&locations).unwrap();
        store.write_daily(&days).unwrap();
        store.write_monthly(&[monthly("90210_CA", 2021, 7, 0.0, 450.0)]).unwrap();
    }
    store.create_indexes().unwrap();
    store.create_indexes().unwrap();

    let counts = store.row_counts().unwrap();
    assert_eq!(counts.locations, 1);
    assert_eq!(counts.daily, 3);
    assert_eq!(counts.monthly, 1);
}

#[test]
#[ignore] // Only run when database is available
fn test_aggregate_without_location_is_rejected() {
    let mut store = setup_test_store();
    let result = store.write_daily(&[daily("00000_XX", date(2021, 1, 1), 30.0)]);
    assert!(matches!(result, Err(StoreError::Postgres(_))));
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[test]
#[ignore] // Only run when database is available
fn test_degree_day_tiers_against_postgres() {
    let mut store = setup_test_store();
    store.write_locations(&[location("90210_CA", "90210", "CA", 2)]).unwrap();
    store
        .write_daily(&[
            daily("90210_CA", date(2021, 7, 1), 80.0),
            daily("90210_CA", date(2021, 7, 2), 82.0),
            daily("90210_CA", date(2021, 7, 3), 78.0),
        ])
        .unwrap();
    store.write_monthly(&[monthly("90210_CA", 2021, 7, 0.0, 450.0)]).unwrap();

    let exact = query::get_degree_days(
        &mut store,
        "90210_CA",
        &DateRange::new(date(2021, 7, 1), date(2021, 7, 3)).unwrap(),
    )
    .unwrap();
    assert!(!exact.is_estimated);
    assert_eq!(exact.days_count, 3);
    assert_eq!(exact.total_cdd, 45.0);

    let monthly_tier = query::get_degree_days(
        &mut store,
        "90210_CA",
        &DateRange::new(date(2021, 7, 20), date(2021, 7, 29)).unwrap(),
    )
    .unwrap();
    assert_eq!(monthly_tier.estimation_method, Some(EstimationMethod::MonthlyAverage));
    assert_eq!(monthly_tier.total_cdd, 150.0);

    let zone_tier = query::get_degree_days(
        &mut store,
        "90210_CA",
        &DateRange::new(date(2023, 1, 1), date(2023, 1, 10)).unwrap(),
    )
    .unwrap();
    assert_eq!(zone_tier.estimation_method, Some(EstimationMethod::ClimateZone));
}

#[test]
#[ignore] // Only run when database is available
fn test_location_and_profile_reads() {
    let mut store = setup_test_store();
    store
        .write_locations(&[
            location("60601_IL", "60601", "IL", 4),
            location("60614_IL", "60614", "IL", 4),
            location("10001_NY", "10001", "NY", 4),
        ])
        .unwrap();
    store
        .write_monthly(&[
            monthly("60601_IL", 2020, 1, 900.0, 0.0),
            monthly("60601_IL", 2021, 1, 1200.0, 0.0),
            monthly("60601_IL", 2021, 7, 0.0, 300.0),
        ])
        .unwrap();
    let event = |t: &str, count| EventTypeAggregate {
        location_id: "60601_IL".to_string(),
        event_type: t.to_string(),
        count,
        avg_duration_hours: 2.0,
        avg_severity: 3.5,
        avg_impact_score: 6.0,
    };
    store.write_event_types(&[event("Snow", 4), event("Cold", 9)]).unwrap();

    let nearest = query::find_nearest_location(&mut store, "62701", Some("IL")).unwrap().unwrap();
    assert_eq!(nearest.location_id, "60601_IL");

    let profile = query::get_weather_profile(&mut store, "60601_IL", None).unwrap().unwrap();
    assert_eq!(profile.year, 2021);
    assert_eq!(profile.monthly_data.len(), 2);
    assert_eq!(profile.event_stats[0].event_type, "Cold");
    assert_eq!(profile.climate_indicators.annual_hdd, 1200.0);
    assert_eq!(profile.climate_indicators.extreme_events_frequency, 2);
    assert_eq!(profile.climate_indicators.severe_weather_score, 12.0);

    let means = store.monthly_degree_day_means("60601_IL").unwrap();
    assert_eq!(means[&1].hdd, 1050.0);
}

/// weather_energy_service: weather-event aggregation and degree-day
/// estimation for energy analysis.
///
/// # Module structure
///
/// ```text
/// weather_energy_service
/// ├── model       — shared data types (WeatherEventRecord, Location, aggregates, DegreeDays)
/// ├── config      — service configuration loader (weather.toml)
/// ├── db          — PostgreSQL connection and schema validation
/// ├── locations   — location identity, climate zone, running event counts
/// ├── ingest
/// │   ├── schema    — required-column check
/// │   ├── reader    — chunked CSV reader
/// │   ├── normalize — raw row → WeatherEventRecord, per-batch skip accounting
/// │   └── fixtures (test only) — small event CSV
/// ├── analysis
/// │   ├── temperature — temperature inferred from event type and severity
/// │   └── impact      — energy impact score
/// ├── aggregate   — AggregationContext over the daily, monthly, event-type aggregators
/// ├── store       — WeatherStore trait; postgres and in-memory implementations
/// ├── pipeline    — end-to-end ingestion run and summary
/// ├── outputs     — per-state JSON side outputs
/// ├── query
/// │   ├── estimator — tiered degree-day estimation
/// │   ├── seasonal  — adjustment factors and consumption normalization
/// │   ├── hvac      — HVAC energy and savings estimate
/// │   └── profile   — nearest location and weather profile
/// └── endpoint    — HTTP API over the query layer
/// ```

/// Public modules
pub mod aggregate;
pub mod analysis;
pub mod config;
pub mod db;
pub mod endpoint;
pub mod ingest;
pub mod locations;
pub mod model;
pub mod outputs;
pub mod pipeline;
pub mod query;
pub mod store;

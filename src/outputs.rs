//! Side-channel JSON outputs written once per ingestion run.
//!
//! ```text
//! <output_dir>/
//! ├── ingest_summary.json
//! ├── locations_by_state/<STATE>.json          [ {location_id, zip_code, …}, … ]
//! └── degree_days/<STATE>_degree_days.json     {"monthly": {"hdd": {year: {month: avg}}, "cdd": …}}
//! ```
//!
//! A state's monthly HDD figure averages the monthly HDD totals of only
//! those locations whose monthly mean temperature was below the 65°F base;
//! CDD likewise averages only locations above it. A month where no location
//! qualifies reports 0.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::aggregate::SampleStats;
use crate::model::{BASE_TEMP_F, Location, MonthlyAggregate};
use crate::pipeline::PipelineError;

pub const SUMMARY_FILE: &str = "ingest_summary.json";
pub const LOCATIONS_DIR: &str = "locations_by_state";
pub const DEGREE_DAYS_DIR: &str = "degree_days";

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationListing {
    pub location_id: String,
    pub zip_code: String,
    pub city: Option<String>,
    pub county: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub climate_zone: i32,
}

impl From<&Location> for LocationListing {
    fn from(l: &Location) -> Self {
        LocationListing {
            location_id: l.location_id.clone(),
            zip_code: l.zip_code.clone(),
            city: l.city.clone(),
            county: l.county.clone(),
            latitude: l.latitude,
            longitude: l.longitude,
            climate_zone: l.climate_zone,
        }
    }
}

/// year → month → degree days
pub type YearMonthSeries = BTreeMap<i32, BTreeMap<i32, f64>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlyDegreeDaySeries {
    pub hdd: YearMonthSeries,
    pub cdd: YearMonthSeries,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StateDegreeDays {
    pub monthly: MonthlyDegreeDaySeries,
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Groups locations by state, each list in location-id order.
pub fn locations_by_state(locations: &[Location]) -> BTreeMap<String, Vec<LocationListing>> {
    let mut by_state: BTreeMap<String, Vec<LocationListing>> = BTreeMap::new();
    for location in locations {
        by_state
            .entry(location.state.clone())
            .or_default()
            .push(LocationListing::from(location));
    }
    for listings in by_state.values_mut() {
        listings.sort_by(|a, b| a.location_id.cmp(&b.location_id));
    }
    by_state
}

/// Per-state monthly degree-day averages. Every state with at least one
/// location gets an entry, even with no monthly rows.
pub fn state_degree_days(locations: &[Location], monthly: &[MonthlyAggregate]) -> BTreeMap<String, StateDegreeDays> {
    let state_of: BTreeMap<&str, &str> = locations
        .iter()
        .map(|l| (l.location_id.as_str(), l.state.as_str()))
        .collect();

    type Samples = BTreeMap<String, BTreeMap<(i32, i32), (SampleStats, SampleStats)>>;
    let mut samples: Samples = BTreeMap::new();
    for state in state_of.values() {
        samples.entry(state.to_string()).or_default();
    }

    for row in monthly {
        let Some(state) = state_of.get(row.location_id.as_str()) else {
            continue;
        };
        let (hdd, cdd) = samples
            .entry(state.to_string())
            .or_default()
            .entry((row.year, row.month))
            .or_default();

        if let Some(t) = row.avg_temp {
            if t < BASE_TEMP_F {
                hdd.add(row.total_heating_degree_days);
            }
            if t > BASE_TEMP_F {
                cdd.add(row.total_cooling_degree_days);
            }
        }
    }

    samples
        .into_iter()
        .map(|(state, months)| {
            let mut series = MonthlyDegreeDaySeries::default();
            for ((year, month), (hdd, cdd)) in months {
                series
                    .hdd
                    .entry(year)
                    .or_default()
                    .insert(month, hdd.mean().unwrap_or(0.0));
                series
                    .cdd
                    .entry(year)
                    .or_default()
                    .insert(month, cdd.mean().unwrap_or(0.0));
            }
            (state, StateDegreeDays { monthly: series })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PipelineError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Writes `locations_by_state/<STATE>.json`. Returns the number of files.
pub fn write_locations_by_state(output_dir: &Path, locations: &[Location]) -> Result<usize, PipelineError> {
    let dir = output_dir.join(LOCATIONS_DIR);
    fs::create_dir_all(&dir)?;

    let by_state = locations_by_state(locations);
    for (state, listings) in &by_state {
        write_json(&dir.join(format!("{}.json", state)), listings)?;
    }
    Ok(by_state.len())
}

/// Writes `degree_days/<STATE>_degree_days.json`. Returns the number of files.
pub fn write_degree_days(
    output_dir: &Path,
    locations: &[Location],
    monthly: &[MonthlyAggregate],
) -> Result<usize, PipelineError> {
    let dir = output_dir.join(DEGREE_DAYS_DIR);
    fs::create_dir_all(&dir)?;

    let by_state = state_degree_days(locations, monthly);
    for (state, degree_days) in &by_state {
        write_json(&dir.join(format!("{}_degree_days.json", state)), degree_days)?;
    }
    Ok(by_state.len())
}

pub fn write_summary<T: Serialize>(output_dir: &Path, summary: &T) -> Result<PathBuf, PipelineError> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(SUMMARY_FILE);
    write_json(&path, summary)?;
    Ok(path)
}

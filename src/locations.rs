//! Location resolution for incoming weather events.
//!
//! A location is identified by `"{zip}_{state}"`; zip codes alone repeat
//! across states. The registry remembers the first sighting of each
//! location (city, county, coordinates, climate zone) and keeps a running
//! event count that becomes `Location::event_frequency` at flush time.

use std::collections::BTreeMap;

use crate::model::{Location, WeatherEventRecord};

// ---------------------------------------------------------------------------
// Identity and climate zone
// ---------------------------------------------------------------------------

/// Composite location identity.
pub fn location_id(zip_code: &str, state: &str) -> String {
    format!("{}_{}", zip_code, state)
}

/// Coarse climate zone (1 = hot/tropical … 5 = cold) from absolute latitude.
///
/// Latitude bands: <27° → 1, <34° → 2, <40° → 3, <45° → 4, otherwise 5.
/// A missing latitude falls through every band and lands in zone 5.
pub fn estimate_climate_zone(latitude: Option<f64>) -> i32 {
    let abs_lat = match latitude {
        Some(lat) if lat.is_finite() => lat.abs(),
        _ => return 5,
    };

    if abs_lat < 27.0 {
        1
    } else if abs_lat < 34.0 {
        2
    } else if abs_lat < 40.0 {
        3
    } else if abs_lat < 45.0 {
        4
    } else {
        5
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// First-sighting metadata plus running event count for one location.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationEntry {
    pub zip_code: String,
    pub city: Option<String>,
    pub county: Option<String>,
    pub state: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub climate_zone: i32,
    pub event_count: u64,
}

/// All locations seen during one ingestion run.
#[derive(Debug, Default, Clone)]
pub struct LocationRegistry {
    entries: BTreeMap<String, LocationEntry>,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the record's location, creating it on first sighting, and
    /// counts the event against it. Returns the location id.
    pub fn resolve(&mut self, record: &WeatherEventRecord) -> String {
        let id = location_id(&record.zip_code, &record.state);

        let entry = self.entries.entry(id.clone()).or_insert_with(|| LocationEntry {
            zip_code: record.zip_code.clone(),
            city: record.city.clone(),
            county: record.county.clone(),
            state: record.state.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
            climate_zone: estimate_climate_zone(record.latitude),
            event_count: 0,
        });
        entry.event_count += 1;

        id
    }

    pub fn get(&self, location_id: &str) -> Option<&LocationEntry> {
        self.entries.get(location_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Folds another registry into this one. The earlier sighting's metadata
    /// wins; event counts add.
    pub fn merge(&mut self, other: LocationRegistry) {
        for (id, entry) in other.entries {
            match self.entries.get_mut(&id) {
                Some(existing) => existing.event_count += entry.event_count,
                None => {
                    self.entries.insert(id, entry);
                }
            }
        }
    }

    /// Converts the registry into persisted `Location` rows.
    pub fn finish(self, nominal_span_years: f64) -> Vec<Location> {
        self.entries
            .into_iter()
            .map(|(location_id, e)| Location {
                location_id,
                zip_code: e.zip_code,
                city: e.city,
                county: e.county,
                state: e.state,
                latitude: e.latitude,
                longitude: e.longitude,
                climate_zone: e.climate_zone,
                event_frequency: e.event_count as f64 / nominal_span_years,
            })
            .collect()
    }
}

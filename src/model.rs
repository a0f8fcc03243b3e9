//! Core data types for the weather energy service.
//!
//! This module defines the shared domain model imported by all other modules:
//! the typed weather event record produced at the ingest boundary, the four
//! persisted aggregate entities, and the domain constants used by the
//! degree-day and impact calculations. It contains no I/O.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Domain constants
// ---------------------------------------------------------------------------

/// Base temperature (°F) for both heating and cooling degree days.
pub const BASE_TEMP_F: f64 = 65.0;

/// Fixed month length used when turning a monthly average degree-day rate
/// into a monthly total. Applied regardless of the real month length.
pub const DAYS_PER_MONTH_APPROX: f64 = 30.0;

/// Nominal number of years covered by the source dataset (2016-2022).
/// Divisor for `Location::event_frequency`.
pub const NOMINAL_SPAN_YEARS: f64 = 7.0;

// ---------------------------------------------------------------------------
// Event classification
// ---------------------------------------------------------------------------

/// Weather event type as reported by the source dataset.
///
/// Unrecognised types are preserved verbatim in `Other` so they still get
/// their own event-type aggregate row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventType {
    Cold,
    Heat,
    Snow,
    Thunderstorm,
    Rain,
    Fog,
    Hail,
    Wind,
    Hurricane,
    Tornado,
    Precipitation,
    Cloudy,
    Other(String),
}

impl EventType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Cold" => EventType::Cold,
            "Heat" => EventType::Heat,
            "Snow" => EventType::Snow,
            "Thunderstorm" => EventType::Thunderstorm,
            "Rain" => EventType::Rain,
            "Fog" => EventType::Fog,
            "Hail" => EventType::Hail,
            "Wind" => EventType::Wind,
            "Hurricane" => EventType::Hurricane,
            "Tornado" => EventType::Tornado,
            "Precipitation" => EventType::Precipitation,
            "Cloudy" => EventType::Cloudy,
            other => EventType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventType::Cold => "Cold",
            EventType::Heat => "Heat",
            EventType::Snow => "Snow",
            EventType::Thunderstorm => "Thunderstorm",
            EventType::Rain => "Rain",
            EventType::Fog => "Fog",
            EventType::Hail => "Hail",
            EventType::Wind => "Wind",
            EventType::Hurricane => "Hurricane",
            EventType::Tornado => "Tornado",
            EventType::Precipitation => "Precipitation",
            EventType::Cloudy => "Cloudy",
            EventType::Other(s) => s.as_str(),
        }
    }

    /// Severe weather types counted toward `severe_events` and
    /// `severe_event_days`.
    pub fn is_severe(&self) -> bool {
        matches!(
            self,
            EventType::Cold
                | EventType::Snow
                | EventType::Thunderstorm
                | EventType::Hail
                | EventType::Hurricane
                | EventType::Tornado
                | EventType::Heat
        )
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event severity label. `Unknown` is the dataset's explicit `UNK` marker;
/// anything else unrecognised lands in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Severity {
    Extreme,
    Severe,
    Heavy,
    Moderate,
    Light,
    Unknown,
    Other(String),
}

impl Severity {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Extreme" => Severity::Extreme,
            "Severe" => Severity::Severe,
            "Heavy" => Severity::Heavy,
            "Moderate" => Severity::Moderate,
            "Light" => Severity::Light,
            "UNK" => Severity::Unknown,
            other => Severity::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Severity::Extreme => "Extreme",
            Severity::Severe => "Severe",
            Severity::Heavy => "Heavy",
            Severity::Moderate => "Moderate",
            Severity::Light => "Light",
            Severity::Unknown => "UNK",
            Severity::Other(s) => s.as_str(),
        }
    }

    /// Numeric severity used for `EventTypeAggregate::avg_severity`.
    pub fn numeric(&self) -> f64 {
        match self {
            Severity::Extreme => 4.0,
            Severity::Severe => 3.0,
            Severity::Heavy => 3.5,
            Severity::Moderate => 2.0,
            Severity::Light => 1.0,
            Severity::Unknown | Severity::Other(_) => 2.0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Input record
// ---------------------------------------------------------------------------

/// A single weather event, validated and typed at the ingest boundary.
///
/// Instants are naive UTC. The calendar date used for aggregation is the
/// date of `start` with no timezone correction; `timezone` is carried only
/// as metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherEventRecord {
    pub event_id: Option<String>,
    pub event_type: EventType,
    pub severity: Severity,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub precipitation_in: Option<f64>,
    pub timezone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub state: String,
    pub zip_code: String,
}

impl WeatherEventRecord {
    /// Event duration in fractional hours.
    pub fn duration_hours(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 3600.0
    }

    /// Calendar date the event is aggregated under.
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }
}

// ---------------------------------------------------------------------------
// Persisted entities
// ---------------------------------------------------------------------------

/// An aggregation locus, keyed by `"{zip}_{state}"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub location_id: String,
    pub zip_code: String,
    pub city: Option<String>,
    pub county: Option<String>,
    pub state: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// 1 (hot) through 5 (cold), derived from latitude on first sighting.
    pub climate_zone: i32,
    /// Events per year over the nominal dataset span.
    pub event_frequency: f64,
}

/// Per (date, location) weather summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub location_id: String,
    pub avg_temp: Option<f64>,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub precipitation: f64,
    pub heating_degree_days: f64,
    pub cooling_degree_days: f64,
    pub severe_events: i64,
    pub impact_score: f64,
}

/// Per (year, month, location) weather summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub year: i32,
    pub month: i32,
    pub location_id: String,
    pub avg_temp: Option<f64>,
    pub total_heating_degree_days: f64,
    pub total_cooling_degree_days: f64,
    pub precipitation: f64,
    /// Number of distinct calendar days with at least one severe event.
    pub severe_event_days: i64,
    pub avg_impact_score: f64,
}

/// Per (location, event type) summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTypeAggregate {
    pub location_id: String,
    pub event_type: String,
    pub count: i64,
    pub avg_duration_hours: f64,
    pub avg_severity: f64,
    pub avg_impact_score: f64,
}

// ---------------------------------------------------------------------------
// Degree days
// ---------------------------------------------------------------------------

/// Heating/cooling degree days for one period.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DegreeDays {
    pub hdd: f64,
    pub cdd: f64,
}

impl DegreeDays {
    /// Degree days for a single day with the given average temperature.
    /// An absent temperature contributes zero to both.
    pub fn from_avg_temp(avg_temp: Option<f64>) -> Self {
        match avg_temp {
            Some(t) => DegreeDays {
                hdd: (BASE_TEMP_F - t).max(0.0),
                cdd: (t - BASE_TEMP_F).max(0.0),
            },
            None => DegreeDays::default(),
        }
    }

    pub fn scaled(self, factor: f64) -> Self {
        DegreeDays {
            hdd: self.hdd * factor,
            cdd: self.cdd * factor,
        }
    }

    pub fn combined(&self) -> f64 {
        self.hdd + self.cdd
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

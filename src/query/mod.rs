/// Read-side query API over a `WeatherStore`.
///
/// - `estimator` — degree days for a date range, through four accuracy tiers
/// - `seasonal`  — per-month adjustment factors and consumption normalization
/// - `hvac`      — HVAC energy and savings estimate from degree days
/// - `profile`   — nearest-location lookup and yearly weather profile
///
/// Missing data is never an error here: every query answers with a
/// best-effort value and says how it was estimated. Only store failures
/// and malformed ranges surface as `QueryError`.

pub mod estimator;
pub mod hvac;
pub mod profile;
pub mod seasonal;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use crate::store::{StoreError, YearMonth};

pub use estimator::{DegreeDayEstimate, EstimationMethod, EstimationTier, get_degree_days};
pub use hvac::{HvacImpact, HvacParameters, get_weather_impact_for_hvac};
pub use profile::{ClimateIndicators, WeatherProfile, find_nearest_location, get_weather_profile};
pub use seasonal::{
    ConsumptionPoint, NormalizedPoint, calculate_weather_normalized_consumption,
    get_seasonal_adjustment_factors,
};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid date range: {end} is before {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, QueryError> {
        if end < start {
            return Err(QueryError::InvalidRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    /// From the first day of the same month one year earlier, through
    /// `today`.
    pub fn trailing_year(today: NaiveDate) -> Self {
        let start = NaiveDate::from_ymd_opt(today.year() - 1, today.month(), 1).unwrap_or(today);
        DateRange { start, end: today }
    }

    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn first_month(&self) -> YearMonth {
        (self.start.year(), self.start.month() as i32)
    }

    pub fn last_month(&self) -> YearMonth {
        (self.end.year(), self.end.month() as i32)
    }
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

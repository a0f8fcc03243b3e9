//! Location lookup and per-year weather profile.

use std::collections::BTreeMap;

use chrono::{Datelike, Utc};
use serde::Serialize;

use super::QueryError;
use crate::model::{EventTypeAggregate, Location, MonthlyAggregate};
use crate::store::WeatherStore;

/// Event types averaging above this severity count as extreme.
pub const EXTREME_SEVERITY: f64 = 3.0;
/// Event types averaging above this impact count toward the severe score.
pub const SEVERE_IMPACT: f64 = 5.0;

/// Resolves a zip code (and optional state) to a stored location.
///
/// Tries, in order: exact zip match (within the state when given), the
/// first location in the state, the first location overall.
pub fn find_nearest_location<S>(
    store: &mut S,
    zip_code: &str,
    state: Option<&str>,
) -> Result<Option<Location>, QueryError>
where
    S: WeatherStore + ?Sized,
{
    let zip_code = zip_code.trim();
    let state = state.map(str::trim).filter(|s| !s.is_empty());

    if let Some(location) = store.location_by_zip(zip_code, state)? {
        return Ok(Some(location));
    }
    if let Some(state) = state {
        if let Some(location) = store.first_location_in_state(state)? {
            log::debug!("No location for zip {}, using first in {}", zip_code, state);
            return Ok(Some(location));
        }
    }
    log::debug!("No location for zip {}, using first overall", zip_code);
    Ok(store.first_location()?)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateIndicators {
    pub annual_hdd: f64,
    pub annual_cdd: f64,
    pub heating_dominated: bool,
    pub cooling_dominated: bool,
    pub extreme_events_frequency: usize,
    pub severe_weather_score: f64,
    pub estimated_annual_energy_impact: f64,
}

impl ClimateIndicators {
    pub fn from_rows(monthly: &[MonthlyAggregate], event_stats: &[EventTypeAggregate]) -> Self {
        let annual_hdd: f64 = monthly.iter().map(|m| m.total_heating_degree_days).sum();
        let annual_cdd: f64 = monthly.iter().map(|m| m.total_cooling_degree_days).sum();

        ClimateIndicators {
            annual_hdd,
            annual_cdd,
            heating_dominated: annual_hdd > annual_cdd,
            cooling_dominated: annual_cdd > annual_hdd,
            extreme_events_frequency: event_stats
                .iter()
                .filter(|e| e.avg_severity > EXTREME_SEVERITY)
                .count(),
            severe_weather_score: event_stats
                .iter()
                .map(|e| e.avg_impact_score)
                .filter(|score| *score > SEVERE_IMPACT)
                .sum(),
            estimated_annual_energy_impact: (annual_hdd * 0.5 + annual_cdd * 0.7) / 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherProfile {
    pub location: Location,
    pub year: i32,
    /// Keyed by month number.
    pub monthly_data: BTreeMap<i32, MonthlyAggregate>,
    /// Most frequent event type first.
    pub event_stats: Vec<EventTypeAggregate>,
    pub climate_indicators: ClimateIndicators,
}

/// Profile for one year of a location. `None` for an unknown location.
///
/// Without a year, uses the latest year with monthly data, else the current
/// calendar year.
pub fn get_weather_profile<S>(
    store: &mut S,
    location_id: &str,
    year: Option<i32>,
) -> Result<Option<WeatherProfile>, QueryError>
where
    S: WeatherStore + ?Sized,
{
    let Some(location) = store.location(location_id)? else {
        return Ok(None);
    };

    let year = match year {
        Some(year) => year,
        None => store
            .latest_monthly_year(location_id)?
            .unwrap_or_else(|| Utc::now().year()),
    };

    let monthly = store.monthly_for_year(location_id, year)?;
    let event_stats = store.event_types(location_id)?;
    let climate_indicators = ClimateIndicators::from_rows(&monthly, &event_stats);

    Ok(Some(WeatherProfile {
        location,
        year,
        monthly_data: monthly.into_iter().map(|m| (m.month, m)).collect(),
        event_stats,
        climate_indicators,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(month: i32, hdd: f64, cdd: f64) -> MonthlyAggregate {
        MonthlyAggregate {
            year: 2021,
            month,
            location_id: "60601_IL".to_string(),
            avg_temp: None,
            total_heating_degree_days: hdd,
            total_cooling_degree_days: cdd,
            precipitation: 0.0,
            severe_event_days: 0,
            avg_impact_score: 0.0,
        }
    }

    fn event(event_type: &str, severity: f64, impact: f64) -> EventTypeAggregate {
        EventTypeAggregate {
            location_id: "60601_IL".to_string(),
            event_type: event_type.to_string(),
            count: 1,
            avg_duration_hours: 1.0,
            avg_severity: severity,
            avg_impact_score: impact,
        }
    }

    #[test]
    fn test_climate_indicators() {
        let monthly = vec![month(1, 1000.0, 0.0), month(7, 0.0, 400.0)];
        let events = vec![
            event("Cold", 4.0, 5.0625),
            event("Snow", 3.5, 4.5),
            event("Rain", 1.0, 1.2),
            event("Heat", 3.0, 6.0),
        ];
        let indicators = ClimateIndicators::from_rows(&monthly, &events);

        assert_eq!(indicators.annual_hdd, 1000.0);
        assert_eq!(indicators.annual_cdd, 400.0);
        assert!(indicators.heating_dominated);
        assert!(!indicators.cooling_dominated);
        assert_eq!(indicators.extreme_events_frequency, 2);
        assert!((indicators.severe_weather_score - 11.0625).abs() < 1e-12);
        assert!((indicators.estimated_annual_energy_impact - 0.78).abs() < 1e-12);
    }

    #[test]
    fn test_balanced_climate_is_neither_dominated() {
        let indicators = ClimateIndicators::from_rows(&[], &[]);
        assert!(!indicators.heating_dominated);
        assert!(!indicators.cooling_dominated);
        assert_eq!(indicators.severe_weather_score, 0.0);
    }
}
